//! dg whoami command implementation.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};

use super::task::{open_store, resolve_user};

pub struct WhoamiOptions {
    pub user: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run_whoami(options: WhoamiOptions) -> Result<()> {
    let store = open_store(options.data_dir.as_deref())?;
    let user = resolve_user(&store, options.user.as_deref())?;

    #[derive(Serialize)]
    struct WhoamiReport<'a> {
        id: &'a str,
        name: &'a str,
        data_dir: String,
    }

    let mut human = HumanOutput::new(format!("You are {}", user.name));
    human.push_summary("id", &user.id);
    human.push_summary("data dir", store.storage().data_dir().display().to_string());

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "whoami",
        &WhoamiReport {
            id: &user.id,
            name: &user.name,
            data_dir: store.storage().data_dir().display().to_string(),
        },
        Some(&human),
    )
}
