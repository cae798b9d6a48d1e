use std::sync::Arc;

use reqwest::Client;
use shared::{
    domain::{Activity, ActivityId, ClientId, ClientProfile},
    forms::{ActivityForm, UserForm},
};
use tracing::info;

pub mod controller;
pub mod debounce;
pub mod epoch;
pub mod error;
pub mod http;
pub mod query;
pub mod settings;
pub mod source;

pub use controller::{FetchOutcome, ListController, ListEvent, ListOptions, ListView};
pub use error::FetchError;
pub use http::HttpCollection;
pub use query::{QueryAction, QueryState};
pub use settings::{load_settings, DashboardSettings};
pub use source::{PageSource, ResultPage};

/// Entry point for the marketing screens: one HTTP collection per resource and
/// the list controllers built on top of them.
pub struct DashboardClient {
    options: ListOptions,
    activities: Arc<HttpCollection<Activity>>,
    clients: Arc<HttpCollection<ClientProfile>>,
}

impl DashboardClient {
    pub fn new(settings: &DashboardSettings) -> anyhow::Result<Self> {
        let base = settings.api_base()?;
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .build()?;
        info!(api_base = %base, "dashboard client configured");
        Ok(Self {
            options: ListOptions::from(settings),
            activities: Arc::new(HttpCollection::new(
                client.clone(),
                &base,
                http::ACTIVITIES_PATH,
            )?),
            clients: Arc::new(HttpCollection::new(client, &base, http::CLIENTS_PATH)?),
        })
    }

    pub fn activities(&self) -> &Arc<HttpCollection<Activity>> {
        &self.activities
    }

    pub fn clients(&self) -> &Arc<HttpCollection<ClientProfile>> {
        &self.clients
    }

    pub fn activity_list(&self) -> Arc<ListController<Activity>> {
        ListController::new(self.activities.clone(), self.options)
    }

    pub fn client_list(&self) -> Arc<ListController<ClientProfile>> {
        ListController::new(self.clients.clone(), self.options)
    }

    pub async fn create_activity(
        &self,
        list: &ListController<Activity>,
        form: &ActivityForm,
    ) -> Result<(), FetchError> {
        form.validate()?;
        list.apply_mutation("create activity", self.activities.create(form))
            .await
    }

    pub async fn update_activity(
        &self,
        list: &ListController<Activity>,
        id: &ActivityId,
        form: &ActivityForm,
    ) -> Result<(), FetchError> {
        form.validate()?;
        list.apply_mutation("update activity", self.activities.update(&id.0, form))
            .await
    }

    pub async fn delete_activity(
        &self,
        list: &ListController<Activity>,
        id: &ActivityId,
    ) -> Result<(), FetchError> {
        list.apply_mutation("delete activity", self.activities.delete(&id.0))
            .await
    }

    pub async fn create_client(
        &self,
        list: &ListController<ClientProfile>,
        form: &UserForm,
    ) -> Result<(), FetchError> {
        form.validate()?;
        list.apply_mutation("create user", self.clients.create(form))
            .await
    }

    pub async fn update_client(
        &self,
        list: &ListController<ClientProfile>,
        id: &ClientId,
        form: &UserForm,
    ) -> Result<(), FetchError> {
        form.validate()?;
        list.apply_mutation("update user", self.clients.update(&id.0, form))
            .await
    }

    pub async fn delete_client(
        &self,
        list: &ListController<ClientProfile>,
        id: &ClientId,
    ) -> Result<(), FetchError> {
        list.apply_mutation("delete user", self.clients.delete(&id.0))
            .await
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod controller_tests;

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod http_tests;
