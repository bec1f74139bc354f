use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use serde_json::Value;

use super::call::ResolvedCall;
use crate::counters::CounterRegistry;
use crate::error::SnapError;
use crate::hooks::Mismatch;
use crate::metrics;
use crate::prune::UsedSnapshot;
use crate::store::{LoadOptions, RecordStore, SaveOptions};
use crate::value::{normalize, serialize_compact, serialize_pretty, SnapValue};

/// Long unique name of one snapshot: `"<spec> <index>"`.
pub fn form_key(spec: &str, index: u32) -> String {
    format!("{} {}", spec, index)
}

/// Resolve the key of this call; exact names never touch the counter.
fn resolve_key(counters: &CounterRegistry, call: &ResolvedCall) -> Result<String> {
    if let Some(exact) = &call.exact {
        return Ok(exact.clone());
    }
    let spec = call
        .spec
        .as_deref()
        .ok_or_else(|| anyhow!("spec name missing after validation"))?;
    let index = counters.next_index(spec);
    debug!("spec \"{}\" snapshot is #{}", spec, index);
    Ok(form_key(spec, index))
}

fn find_stored_value(store: &dyn RecordStore, call: &ResolvedCall, key: &str) -> Result<Option<Value>> {
    if call.config.update {
        // let the new value replace the current one
        return Ok(None);
    }
    debug!(
        "loading snapshots from {} {} for key \"{}\"",
        store.path_relative_to_cwd(&call.file),
        call.ext,
        key
    );
    let records = store.load_records(&call.file, &call.ext, LoadOptions::from(&call.config))?;
    Ok(records.and_then(|r| r.get(key).cloned()))
}

fn store_value(store: &dyn RecordStore, call: &ResolvedCall, key: &str, value: &Value) -> Result<()> {
    let mut records = store
        .load_records(&call.file, &call.ext, LoadOptions::from(&call.config))?
        .unwrap_or_default();
    records.insert(key.to_string(), value.clone());

    if call.config.show || call.config.dry_run {
        println!(
            "saving snapshot \"{}\" for file {}",
            key,
            store.path_relative_to_cwd(&call.file)
        );
        println!("{}", serialize_pretty(value));
    }

    if call.config.dry_run {
        return Ok(());
    }

    store.save_records(&call.file, &records, &call.ext, SaveOptions::from(&call.config))?;
    info!(
        "saved snapshot \"{}\" in {}",
        key,
        store.path_relative_to_cwd(&call.file)
    );
    if let Some(comment) = &call.comment {
        debug!("snapshot \"{}\" comment: {}", key, comment);
    }
    metrics::record_saved();
    Ok(())
}

fn ci_forbidden(store: &dyn RecordStore, call: &ResolvedCall, key: &str, value: &SnapValue) -> anyhow::Error {
    if let Ok(cwd) = std::env::current_dir() {
        println!("current directory {}", cwd.display());
    }
    println!("new value to save: {}", value.serialized());
    warn!(
        "refusing to create snapshot \"{}\" in {} on CI",
        key,
        store.path_relative_to_cwd(&call.file)
    );
    metrics::record_ci_blocked();
    SnapError::CiWriteForbidden {
        file: call.file.display().to_string(),
        spec: call.display_name().to_string(),
        key: key.to_string(),
    }
    .into()
}

/// Key resolution -> lookup -> first write (or CI block) / compare (or raise).
pub(crate) fn set_or_check(
    store: &dyn RecordStore,
    counters: &CounterRegistry,
    call: &ResolvedCall,
    input: SnapValue,
) -> Result<Value> {
    let key = resolve_key(counters, call)?;
    counters.mark_used(UsedSnapshot {
        file: call.file.clone(),
        key: key.clone(),
        ext: call.ext.clone(),
        use_relative_path: call.config.use_relative_path,
    });

    let value = normalize(&input)?;

    let expected = match find_stored_value(store, call, &key)? {
        Some(e) => e,
        None => {
            if call.config.ci {
                return Err(ci_forbidden(store, call, &key, &value));
            }
            let stored = call.hooks.transform(value)?;
            let stored = stored.into_data().ok_or_else(|| {
                SnapError::invalid(format!(
                    "cannot store a function value in snapshot \"{}\"; transform it into data first",
                    key
                ))
            })?;
            store_value(store, call, &key, &stored)?;
            return Ok(stored);
        }
    };

    debug!(
        "found snapshot for \"{}\", value {}",
        call.display_name(),
        serialize_compact(&expected)
    );
    match call.hooks.compare(&expected, &value) {
        Ok(()) => metrics::record_matched(),
        Err(message) => {
            metrics::record_mismatched();
            let mismatch = Mismatch {
                file: &call.file,
                spec: call.display_name(),
                key: &key,
                expected: &expected,
                value: &value,
                message: &message,
            };
            call.hooks.raise(store, &mismatch)?;
        }
    }
    Ok(expected)
}
