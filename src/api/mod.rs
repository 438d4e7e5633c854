//! Resource accessors
//!
//! Thin typed shims over [`ApiClient`], one per entity. They carry no logic of their
//! own: inputs are only checked by the type system and backend errors propagate as-is.

mod papers;
mod projects;
mod runs;

pub use papers::PapersApi;
pub use projects::ProjectsApi;
pub use runs::RunsApi;

use crate::transport::ApiClient;

impl ApiClient {
    pub fn projects(&self) -> ProjectsApi<'_> {
        ProjectsApi::new(self)
    }

    pub fn runs(&self) -> RunsApi<'_> {
        RunsApi::new(self)
    }

    pub fn papers(&self) -> PapersApi<'_> {
        PapersApi::new(self)
    }
}
