use shared::{
    domain::PointsRecord,
    protocol::{HOLDER_NOT_FOUND_SENTINEL, POINTS_NOT_FOUND_SENTINEL},
};
use tracing::{debug, info};

pub mod error;
pub mod transport;
pub mod types;
pub mod view_model;

pub use error::ClientError;
pub use transport::{HttpPointsClient, PointsApi};
pub use types::{HolderForm, PointsForm};
pub use view_model::{Panels, PointsRow, PointsViewModel};

/// Binds the four user actions to a [`PointsApi`] and reflects each
/// outcome into an owned [`PointsViewModel`].
///
/// A failed call (transport error, non-2xx status) leaves the view model
/// as it was and is handed back to the caller.
pub struct UiController<A: PointsApi> {
    api: A,
    view: PointsViewModel,
}

impl<A: PointsApi> UiController<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            view: PointsViewModel::default(),
        }
    }

    pub fn view(&self) -> &PointsViewModel {
        &self.view
    }

    pub async fn query_all_points(&mut self) -> Result<(), ClientError> {
        let entries = self.api.query_all_points().await?;
        self.view.all_points = view_model::rows_from_entries(entries);
        debug!(rows = self.view.all_points.len(), "all points refreshed");
        Ok(())
    }

    pub async fn query_points(&mut self, id: &str) -> Result<(), ClientError> {
        let body = self.api.query_points(id).await?;
        let missing = body == POINTS_NOT_FOUND_SENTINEL;
        self.view.queried_record = if missing {
            None
        } else {
            serde_json::from_str::<PointsRecord>(&body).ok()
        };
        self.view.query_points = Some(body);
        self.view.panels.error_query = missing;
        Ok(())
    }

    /// Shows the success panel for any response body; the legacy route has
    /// no failure body to distinguish.
    pub async fn record_points(&mut self, form: &PointsForm) -> Result<(), ClientError> {
        let body = self.api.record_points(form).await?;
        info!(path = %form.request_path(), "points submitted");
        self.view.create_points = Some(body);
        self.view.panels.success_create = true;
        Ok(())
    }

    pub async fn change_holder(&mut self, form: &HolderForm) -> Result<(), ClientError> {
        let body = self.api.change_holder(form).await?;
        let missing = body == HOLDER_NOT_FOUND_SENTINEL;
        self.view.change_holder = Some(body);
        self.view.panels.error_holder = missing;
        self.view.panels.success_holder = !missing;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
