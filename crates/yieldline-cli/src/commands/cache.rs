use serde_json::json;
use yieldline_core::{CacheConfig, FileCache};

use crate::cli::{CacheArgs, CacheCommand, PurgeArgs};
use crate::config::AppContext;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &CacheArgs, context: &AppContext) -> Result<CommandResult, CliError> {
    let backend = context.cache.name();

    match &args.command {
        CacheCommand::Get(key_args) => {
            let entry = context.cache.entry(&key_args.key).await?;
            let found = entry.is_some();
            let result = CommandResult::ok(
                json!({
                    "backend": backend,
                    "key": key_args.key,
                    "found": found,
                    "entry": entry,
                }),
                Vec::new(),
            )
            .with_cache_hit(found);
            Ok(result)
        }
        CacheCommand::Delete(key_args) => {
            context.cache.delete(&key_args.key).await?;
            Ok(CommandResult::ok(
                json!({ "backend": backend, "key": key_args.key, "deleted": true }),
                Vec::new(),
            ))
        }
        CacheCommand::Purge(purge_args) => purge(purge_args, &context.cache_config).await,
    }
}

async fn purge(args: &PurgeArgs, config: &CacheConfig) -> Result<CommandResult, CliError> {
    match config {
        CacheConfig::File { dir } => {
            let cache = FileCache::new(dir.clone());
            let removed = if args.all {
                cache.clear().await?
            } else {
                cache.purge_expired().await?
            };

            Ok(CommandResult::ok(
                json!({
                    "backend": config.kind().as_str(),
                    "dir": dir.display().to_string(),
                    "all": args.all,
                    "removed": removed,
                }),
                Vec::new(),
            ))
        }
        CacheConfig::Memory => Ok(CommandResult::ok(
            json!({ "backend": config.kind().as_str(), "all": args.all, "removed": 0 }),
            Vec::new(),
        )
        .with_warning("the memory cache starts empty for every invocation; nothing to purge")),
        CacheConfig::Document { .. } => Err(CliError::Command(String::from(
            "purge is not supported by the document backend; stale documents are removed on read",
        ))),
    }
}
