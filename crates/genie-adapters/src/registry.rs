use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_yaml::Value;

use crate::pool::InvokerBag;

/// One registered template prefix, ported from `_TemplateDirectory` in
/// `examples/original_source/genie_flow/environment.py`: the directory on
/// disk its templates live in, its ancestor-merged `meta.yaml` config, and
/// the invoker pool (if any) that config names.
pub struct TemplateDirectory {
    pub directory: PathBuf,
    pub config: BTreeMap<String, Value>,
    pub invokers: Option<InvokerBag>,
}
