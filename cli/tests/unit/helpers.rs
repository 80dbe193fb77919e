//! Shared descriptor builders for unit tests.

#![allow(dead_code)] // not every test file uses every builder

use std::collections::BTreeMap;

use berth_common::{BuildSpec, Project, Repository};
use berth_cli::application::ports::Identity;
use berth_cli::infra::identity::FixedIdentity;

pub const WORKSPACE_ID: &str = "ws1";
pub const PROJECT_NAME: &str = "api";

pub fn project(build: BuildSpec, image: Option<&str>) -> Project {
    Project {
        name: PROJECT_NAME.to_string(),
        workspace_id: WORKSPACE_ID.to_string(),
        repository: Repository {
            url: "https://example.com/acme/api.git".to_string(),
        },
        image: image.map(str::to_owned),
        build,
        env_vars: BTreeMap::new(),
        user: "dev".to_string(),
        api_key: "key-123".to_string(),
    }
}

pub fn image_project() -> Project {
    project(BuildSpec::Image, Some("alpine:3.19"))
}

pub fn root_identity() -> FixedIdentity {
    FixedIdentity(Identity::ROOT)
}

pub fn user_identity() -> FixedIdentity {
    FixedIdentity(Identity {
        uid: 1000,
        gid: 1000,
    })
}
