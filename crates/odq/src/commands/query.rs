//! Query and url command implementations.
//!
//! Both commands compile the filter and sort arguments the same way; `url`
//! stops after building the request URL, `query` sends it.

use odata_client::client::ODataClientBuilder;
use odata_client::envelope::QueryEnvelope;
use odata_client::query::{build_url, QueryOptions};
use odata_client::settings::{resolve_base_address, SettingsProvider};
use odata_client::CancellationToken;
use odata_filter::compiler::FilterCompiler;
use odata_filter::expr::{parse_sorts, FilterParser};
use odata_filter::sort::SortCompiler;
use tracing::debug;

use super::config::Config;
use super::{CommandContext, CommandError, Result};
use crate::cli::QueryArgs;
use crate::output::{format_envelope_json, format_envelope_table};

/// A fully resolved request.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub base_url: String,
    pub entity_set: String,
    pub options: QueryOptions,
}

/// Resolves the service root and compiles the query options.
///
/// # Errors
///
/// Returns a config error when no service root is known and a filter error
/// when the filter or sort arguments do not parse.
pub fn plan(args: &QueryArgs, config: &Config, base_url: Option<&str>) -> Result<QueryPlan> {
    let settings = config.settings();
    let base_url = base_url
        .map(str::to_string)
        .unwrap_or_else(|| resolve_base_address(&settings, args.backend.as_deref()).to_string());
    if base_url.trim().is_empty() {
        return Err(CommandError::Config(
            "No service root configured. Run 'odq config set base_address <url>' or pass --base-url"
                .to_string(),
        ));
    }

    let filter = match args.filter.as_deref().map(str::trim) {
        Some(expr) if !expr.is_empty() => {
            FilterCompiler::new().compile(&FilterParser::parse(expr)?)
        }
        _ => String::new(),
    };
    let order_by = SortCompiler::new().compile(&parse_sorts(&args.sort)?);

    let mut options = QueryOptions::new()
        .filter(filter)
        .order_by(order_by)
        .with_count(!args.no_count);
    if let Some(top) = args.top.or(settings.page_size()) {
        options = options.top(top);
    }
    if let Some(skip) = args.skip {
        options = options.skip(skip);
    }
    for property in &args.expand {
        options = options.expand(property.clone());
    }

    debug!(entity_set = %args.entity_set, %base_url, "planned query");
    Ok(QueryPlan {
        base_url,
        entity_set: args.entity_set.clone(),
        options,
    })
}

/// Executes the url command.
pub fn execute_url(ctx: &CommandContext, args: &QueryArgs, config: &Config) -> Result<()> {
    let plan = plan(args, config, ctx.base_url.as_deref())?;
    let url = build_url(&plan.base_url, &plan.entity_set, &plan.options)?;

    if ctx.json_output {
        let output = serde_json::json!({
            "url": url.as_str(),
            "filter": plan.options.filter,
            "orderby": plan.options.order_by,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", url);
    }

    Ok(())
}

/// Executes the query command.
pub async fn execute(ctx: &CommandContext, args: &QueryArgs, config: &Config) -> Result<()> {
    let plan = plan(args, config, ctx.base_url.as_deref())?;
    let envelope = run(&plan, config).await?;

    if ctx.json_output {
        println!("{}", format_envelope_json(&envelope)?);
    } else if !ctx.quiet {
        print!("{}", format_envelope_table(&envelope, ctx.use_colors));
    }

    Ok(())
}

/// Sends the planned request.
pub async fn run(plan: &QueryPlan, config: &Config) -> Result<QueryEnvelope<serde_json::Value>> {
    let client = ODataClientBuilder::new(plan.base_url.clone())
        .request_timeout(config.timeout())
        .build()?;
    let envelope = client
        .execute_at(&plan.base_url, &plan.entity_set, &plan.options, &CancellationToken::new())
        .await?;
    Ok(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(entity_set: &str) -> QueryArgs {
        QueryArgs {
            entity_set: entity_set.to_string(),
            ..QueryArgs::default()
        }
    }

    fn config() -> Config {
        let mut config = Config {
            base_address: Some("https://main.example.com/odata".to_string()),
            page_size: Some(25),
            ..Config::default()
        };
        config
            .alternate_base_addresses
            .insert("archive".to_string(), "https://archive.example.com/odata".to_string());
        config
    }

    #[test]
    fn test_plan_compiles_filter_and_sorts() {
        let mut args = args("People");
        args.filter = Some("Email endswith 'yahoo.com' and Age between 18 and 30".to_string());
        args.sort = vec!["LastName".to_string(), "Age desc".to_string()];

        let plan = plan(&args, &config(), None).unwrap();
        assert_eq!(plan.base_url, "https://main.example.com/odata");
        assert_eq!(
            plan.options.filter,
            "endswith(Email,'yahoo.com') and (Age ge 18 and Age le 30)"
        );
        assert_eq!(plan.options.order_by, "LastName,Age desc");
        assert_eq!(plan.options.top, Some(25));
        assert!(plan.options.count);
    }

    #[test]
    fn test_plan_explicit_top_overrides_page_size() {
        let mut args = args("People");
        args.top = Some(5);
        args.skip = Some(10);
        args.no_count = true;
        args.expand = vec!["Department".to_string()];

        let plan = plan(&args, &config(), None).unwrap();
        assert_eq!(plan.options.top, Some(5));
        assert_eq!(plan.options.skip, Some(10));
        assert!(!plan.options.count);
        assert_eq!(plan.options.expand, vec!["Department".to_string()]);
    }

    #[test]
    fn test_plan_backend_selects_alternate_address() {
        let mut args = args("People");
        args.backend = Some("archive".to_string());
        assert_eq!(
            plan(&args, &config(), None).unwrap().base_url,
            "https://archive.example.com/odata"
        );
    }

    #[test]
    fn test_plan_base_url_flag_wins() {
        let mut args = args("People");
        args.backend = Some("archive".to_string());
        let plan = plan(&args, &config(), Some("http://localhost:8080")).unwrap();
        assert_eq!(plan.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_plan_without_base_address_is_config_error() {
        assert!(matches!(
            plan(&args("People"), &Config::default(), None),
            Err(CommandError::Config(_))
        ));
    }

    #[test]
    fn test_plan_bad_filter_is_filter_error() {
        let mut args = args("People");
        args.filter = Some("Age between".to_string());
        assert!(matches!(plan(&args, &config(), None), Err(CommandError::Filter(_))));
    }

    #[test]
    fn test_plan_blank_filter_is_ignored() {
        let mut args = args("People");
        args.filter = Some("   ".to_string());
        assert_eq!(plan(&args, &config(), None).unwrap().options.filter, "");
    }
}
