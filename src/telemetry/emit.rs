use anyhow::Result;
use serde::Serialize;

use crate::output::config::OutputConfig;
use crate::output::types::{Envelope, Meta};
use crate::output::Emitter;

pub fn print_result<T: Serialize>(op: &'static str, result: &T, meta: Option<Meta>) -> Result<()> {
    let env = Envelope::result(op, result, meta)?;
    let mut cfg = OutputConfig::from_env();
    if super::config::json_mode() {
        cfg = cfg.force_json();
    }
    Emitter::from_config(cfg).emit(&env)?;
    Ok(())
}
