//! Cloud Deploy REST API access

pub mod apps;
pub mod client;
pub mod deployments;
pub mod jobs;
pub mod resource;

pub use apps::{AppFilter, Apps};
pub use client::{Credentials, HttpClient};
pub use deployments::{DeploymentFilter, Deployments};
pub use jobs::{JobFilter, Jobs};
pub use resource::{ListQuery, ResourceClient, ResourceFilter, ResourceKind};
