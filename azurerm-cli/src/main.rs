mod config;

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use azurerm_core::context::{Operation, OperationContext, TimeoutOverrides};
use azurerm_core::differ::create_plan;
use azurerm_core::effect::Effect;
use azurerm_core::plan::Plan;
use azurerm_core::provider::Provider;
use azurerm_core::resource::{Resource, ResourceId, State, Value};
use azurerm_core::schema::ResourceSchema;
use azurerm_provider::{AzurermProvider, resources};
use azurerm_state::{StateBackend, StateFile, create_backend};

use crate::config::ConfigFile;

const DEFAULT_CONFIG: &str = "azurerm.json";

#[derive(Parser)]
#[command(name = "azurerm")]
#[command(about = "Manage Azure Relay namespaces, hybrid connections and authorization rules", long_about = None)]
struct Cli {
    /// Enable debug logging (overrides AZURERM_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration file without contacting Azure
    Validate {
        #[arg(default_value = DEFAULT_CONFIG)]
        file: PathBuf,
    },
    /// Show execution plan without applying changes
    Plan {
        #[arg(default_value = DEFAULT_CONFIG)]
        file: PathBuf,
    },
    /// Apply changes to reach the desired state
    Apply {
        #[arg(default_value = DEFAULT_CONFIG)]
        file: PathBuf,
    },
    /// Destroy all resources recorded in state
    Destroy {
        #[arg(default_value = DEFAULT_CONFIG)]
        file: PathBuf,

        /// Skip confirmation prompt
        #[arg(long)]
        auto_approve: bool,
    },
    /// Adopt an existing Azure object into state
    Import {
        file: PathBuf,
        /// Resource type (e.g. relay_namespace)
        resource_type: String,
        /// Resource name in state
        name: String,
        /// ARM resource ID of the existing object
        id: String,
    },
    /// Inspect recorded state
    State {
        #[command(subcommand)]
        command: StateCommands,
    },
    /// Generate shell completions
    Completions { shell: Shell },
}

#[derive(Subcommand)]
enum StateCommands {
    /// List managed resources
    List {
        #[arg(default_value = DEFAULT_CONFIG)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Validate { file } => run_validate(&file),
        Commands::Plan { file } => run_plan(&file).await,
        Commands::Apply { file } => run_apply(&file).await,
        Commands::Destroy { file, auto_approve } => run_destroy(&file, auto_approve).await,
        Commands::Import {
            file,
            resource_type,
            name,
            id,
        } => run_import(&file, &resource_type, &name, &id).await,
        Commands::State {
            command: StateCommands::List { file },
        } => run_state_list(&file).await,
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "azurerm", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("AZURERM_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn get_schemas() -> HashMap<String, ResourceSchema> {
    resources::resource_types()
        .into_iter()
        .filter(|t| !t.is_data_source())
        .map(|t| (t.name().to_string(), t.schema()))
        .collect()
}

fn get_data_source_schemas() -> HashMap<String, ResourceSchema> {
    resources::resource_types()
        .into_iter()
        .filter(|t| t.is_data_source())
        .map(|t| (t.name().to_string(), t.schema()))
        .collect()
}

fn validate_resources(desired: &[Resource]) -> Result<(), String> {
    let mut all_errors = Vec::new();
    for resource in desired {
        if let Err(errors) = resources::validate(resource) {
            for error in errors {
                all_errors.push(format!("{}: {}", resource.id, error));
            }
        }
    }

    if all_errors.is_empty() {
        Ok(())
    } else {
        Err(all_errors.join("\n"))
    }
}

/// Data sources first, then managed resources in dependency order
fn sort_resources(mut desired: Vec<Resource>) -> Vec<Resource> {
    desired.sort_by_key(|r| (!r.is_data_source(), resources::rank(&r.id.resource_type)));
    desired
}

fn load_resources(config: &ConfigFile) -> Result<Vec<Resource>, String> {
    let desired = config.resources()?;
    validate_resources(&desired)?;
    Ok(sort_resources(desired))
}

fn get_provider(config: &ConfigFile) -> Result<AzurermProvider, String> {
    let provider_config = config.provider.clone().with_env_fallback();
    AzurermProvider::new(&provider_config).map_err(|e| format!("Provider configuration: {}", e))
}

fn operation_timeout(
    provider: &dyn Provider,
    id: &ResourceId,
    data_source: bool,
    overrides: &TimeoutOverrides,
    operation: Operation,
) -> Duration {
    let resource_type = if data_source {
        provider.data_source_type(&id.resource_type)
    } else {
        provider.resource_type(&id.resource_type)
    };
    resource_type
        .map(|t| t.timeouts())
        .unwrap_or_default()
        .with_overrides(overrides)
        .for_operation(operation)
}

fn context_for(
    provider: &dyn Provider,
    operation: Operation,
    id: &ResourceId,
    data_source: bool,
    overrides: &TimeoutOverrides,
) -> OperationContext {
    let timeout = operation_timeout(provider, id, data_source, overrides, operation);
    OperationContext::for_resource(operation, id, timeout)
}

async fn read_state_file(backend: &dyn StateBackend) -> Result<StateFile, String> {
    Ok(backend
        .read_state()
        .await
        .map_err(|e| format!("Failed to read state: {}", e))?
        .unwrap_or_default())
}

async fn write_state_file(backend: &dyn StateBackend, state: &mut StateFile) -> Result<(), String> {
    state.increment_serial();
    backend
        .write_state(state)
        .await
        .map_err(|e| format!("Failed to write state: {}", e))
}

/// Re-read every recorded resource. Objects that no longer exist are
/// dropped from `state`.
async fn refresh(provider: &dyn Provider, state: &mut StateFile) -> Result<bool, String> {
    let mut changed = false;
    for recorded in state.states().into_values() {
        tracing::debug!(resource = %recorded.id, "refreshing");
        let ctx = context_for(
            provider,
            Operation::Read,
            &recorded.id,
            false,
            &TimeoutOverrides::default(),
        );
        let current = provider
            .read(&ctx, &recorded.id, recorded.identifier.as_deref())
            .await
            .map_err(|e| format!("Failed to refresh state: {}", e))?;
        if current != recorded {
            changed = true;
            state.record(&current, provider.name());
        }
    }
    Ok(changed)
}

fn run_validate(file: &Path) -> Result<(), String> {
    let config = ConfigFile::load(file)?;
    println!("{}", "Validating...".cyan());

    let desired = load_resources(&config)?;

    println!(
        "{}",
        format!("✓ {} resources validated successfully.", desired.len())
            .green()
            .bold()
    );
    for resource in &desired {
        let kind = if resource.is_data_source() {
            " (data source)"
        } else {
            ""
        };
        println!("  • {}{}", resource.id, kind);
    }
    Ok(())
}

async fn run_plan(file: &Path) -> Result<(), String> {
    let config = ConfigFile::load(file)?;
    let desired = load_resources(&config)?;
    let provider = get_provider(&config)?;
    let backend = create_backend(&config.backend);

    let mut state = read_state_file(backend.as_ref()).await?;
    refresh(&provider, &mut state).await?;

    let schemas = get_schemas();
    let plan = create_plan(&desired, &state.states(), &schemas, resources::rank);
    read_data_sources(&provider, &plan).await?;
    print_plan(&plan, &schemas);
    Ok(())
}

async fn run_apply(file: &Path) -> Result<(), String> {
    let config = ConfigFile::load(file)?;
    let desired = load_resources(&config)?;
    let provider = get_provider(&config)?;
    let backend = create_backend(&config.backend);

    let lock = backend
        .acquire_lock("apply")
        .await
        .map_err(|e| format!("Failed to acquire lock: {}", e))?;
    let result = apply_locked(&provider, backend.as_ref(), &desired).await;
    let released = backend
        .release_lock(&lock)
        .await
        .map_err(|e| format!("Failed to release lock: {}", e));
    result.and(released)
}

async fn apply_locked(
    provider: &AzurermProvider,
    backend: &dyn StateBackend,
    desired: &[Resource],
) -> Result<(), String> {
    let mut state = read_state_file(backend).await?;
    if refresh(provider, &mut state).await? {
        write_state_file(backend, &mut state).await?;
    }

    let schemas = get_schemas();
    let plan = create_plan(desired, &state.states(), &schemas, resources::rank);

    if plan.is_empty() {
        read_data_sources(provider, &plan).await?;
        println!("{}", "No changes needed.".green());
        return Ok(());
    }

    print_plan(&plan, &schemas);
    println!();
    println!("{}", "Applying changes...".cyan().bold());
    println!();

    let mut writer = StateWriter::new(backend, state, provider.name());
    let mut success_count = 0;
    let mut failure_count = 0;

    for effect in plan.effects() {
        match apply_effect(provider, effect, &mut writer).await {
            Ok(()) => {
                if effect.is_mutating() {
                    println!("  {} {}", "✓".green(), format_effect(effect));
                    success_count += 1;
                }
            }
            Err(e) => {
                println!("  {} {} - {}", "✗".red(), format_effect(effect), e);
                failure_count += 1;
            }
        }
    }

    println!();
    if failure_count == 0 {
        println!(
            "{}",
            format!("Apply complete! {} changes applied.", success_count)
                .green()
                .bold()
        );
        Ok(())
    } else {
        Err(format!(
            "Apply failed. {} succeeded, {} failed.",
            success_count, failure_count
        ))
    }
}

/// Holds the state file during an apply and persists every change as soon
/// as it is recorded
struct StateWriter<'a> {
    backend: &'a dyn StateBackend,
    state: StateFile,
    provider: &'static str,
}

impl<'a> StateWriter<'a> {
    fn new(backend: &'a dyn StateBackend, state: StateFile, provider: &'static str) -> Self {
        Self {
            backend,
            state,
            provider,
        }
    }

    async fn record(&mut self, change: &State) -> Result<(), String> {
        self.state.record(change, self.provider);
        write_state_file(self.backend, &mut self.state).await
    }
}

async fn read_data_sources(provider: &dyn Provider, plan: &Plan) -> Result<(), String> {
    for effect in plan.effects() {
        if let Effect::Read(resource) = effect {
            let state = read_data_source(provider, resource)
                .await
                .map_err(|e| format!("{} - {}", resource.id, e))?;
            print_data_source(&state);
        }
    }
    Ok(())
}

async fn read_data_source(provider: &dyn Provider, resource: &Resource) -> Result<State, String> {
    let ctx = context_for(
        provider,
        Operation::Read,
        &resource.id,
        true,
        &resource.timeouts,
    );
    provider
        .read_data_source(&ctx, resource)
        .await
        .map_err(|e| e.to_string())
}

/// Execute one effect and record its outcome through `writer`. A replace
/// records the deletion before recreating, so a failed create never leaves
/// the deleted identifier behind.
async fn apply_effect(
    provider: &dyn Provider,
    effect: &Effect,
    writer: &mut StateWriter<'_>,
) -> Result<(), String> {
    match effect {
        Effect::Read(resource) => {
            let state = read_data_source(provider, resource).await?;
            print_data_source(&state);
            Ok(())
        }
        Effect::Create(resource) => {
            let ctx = context_for(
                provider,
                Operation::Create,
                &resource.id,
                false,
                &resource.timeouts,
            );
            let state = provider
                .create(&ctx, resource)
                .await
                .map_err(|e| e.to_string())?;
            writer.record(&state).await
        }
        Effect::Update {
            id,
            identifier,
            from,
            to,
            ..
        } => {
            let ctx = context_for(provider, Operation::Update, id, false, &to.timeouts);
            let state = provider
                .update(&ctx, id, identifier, from, to)
                .await
                .map_err(|e| e.to_string())?;
            writer.record(&state).await
        }
        Effect::Replace {
            id, identifier, to, ..
        } => {
            let ctx = context_for(provider, Operation::Delete, id, false, &to.timeouts);
            provider
                .delete(&ctx, id, identifier)
                .await
                .map_err(|e| e.to_string())?;
            writer.record(&State::not_found(id.clone())).await?;

            let ctx = context_for(provider, Operation::Create, id, false, &to.timeouts);
            let state = provider
                .create(&ctx, to)
                .await
                .map_err(|e| e.to_string())?;
            writer.record(&state).await
        }
        Effect::Delete { id, identifier } => {
            let ctx = context_for(
                provider,
                Operation::Delete,
                id,
                false,
                &TimeoutOverrides::default(),
            );
            provider
                .delete(&ctx, id, identifier)
                .await
                .map_err(|e| e.to_string())?;
            writer.record(&State::not_found(id.clone())).await
        }
    }
}

async fn run_destroy(file: &Path, auto_approve: bool) -> Result<(), String> {
    let config = ConfigFile::load(file)?;
    let provider = get_provider(&config)?;
    let backend = create_backend(&config.backend);

    let lock = backend
        .acquire_lock("destroy")
        .await
        .map_err(|e| format!("Failed to acquire lock: {}", e))?;
    let result = destroy_locked(&provider, backend.as_ref(), auto_approve).await;
    let released = backend
        .release_lock(&lock)
        .await
        .map_err(|e| format!("Failed to release lock: {}", e));
    result.and(released)
}

async fn destroy_locked(
    provider: &AzurermProvider,
    backend: &dyn StateBackend,
    auto_approve: bool,
) -> Result<(), String> {
    let mut state = read_state_file(backend).await?;
    if refresh(provider, &mut state).await? {
        write_state_file(backend, &mut state).await?;
    }

    // Nothing declared: every recorded resource is deleted, children first
    let plan = create_plan(&[], &state.states(), &HashMap::new(), resources::rank);
    if plan.is_empty() {
        println!("{}", "No resources to destroy.".green());
        return Ok(());
    }

    println!("{}", "Destroy Plan:".red().bold());
    println!();
    for effect in plan.effects() {
        println!("  {} {}", "-".red().bold(), effect.resource_id());
    }
    println!();
    println!(
        "Plan: {} to destroy.",
        plan.mutation_count().to_string().red()
    );
    println!();

    if !auto_approve && !confirm_destroy()? {
        println!();
        println!("{}", "Destroy cancelled.".yellow());
        return Ok(());
    }

    println!("{}", "Destroying resources...".red().bold());
    println!();

    let mut writer = StateWriter::new(backend, state, provider.name());
    let mut success_count = 0;
    let mut failure_count = 0;
    for effect in plan.effects() {
        match apply_effect(provider, effect, &mut writer).await {
            Ok(()) => {
                println!("  {} {}", "✓".green(), format_effect(effect));
                success_count += 1;
            }
            Err(e) => {
                println!("  {} {} - {}", "✗".red(), format_effect(effect), e);
                failure_count += 1;
            }
        }
    }

    println!();
    if failure_count == 0 {
        println!(
            "{}",
            format!("Destroy complete! {} resources destroyed.", success_count)
                .green()
                .bold()
        );
        Ok(())
    } else {
        Err(format!(
            "Destroy failed. {} succeeded, {} failed.",
            success_count, failure_count
        ))
    }
}

fn confirm_destroy() -> Result<bool, String> {
    println!(
        "{}",
        "Do you really want to destroy all resources?"
            .yellow()
            .bold()
    );
    println!(
        "  {}",
        "This action cannot be undone. Type 'yes' to confirm.".yellow()
    );
    print!("\n  Enter a value: ");
    std::io::stdout().flush().map_err(|e| e.to_string())?;

    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .map_err(|e| e.to_string())?;
    Ok(input.trim() == "yes")
}

async fn run_import(
    file: &Path,
    resource_type: &str,
    name: &str,
    identifier: &str,
) -> Result<(), String> {
    let config = ConfigFile::load(file)?;
    let provider = get_provider(&config)?;
    if provider.resource_type(resource_type).is_none() {
        return Err(format!("Unknown resource type: {}", resource_type));
    }
    let backend = create_backend(&config.backend);

    let lock = backend
        .acquire_lock("import")
        .await
        .map_err(|e| format!("Failed to acquire lock: {}", e))?;
    let id = ResourceId::new(resource_type, name);
    let result = import_locked(&provider, backend.as_ref(), &id, identifier).await;
    let released = backend
        .release_lock(&lock)
        .await
        .map_err(|e| format!("Failed to release lock: {}", e));
    result.and(released)
}

async fn import_locked(
    provider: &AzurermProvider,
    backend: &dyn StateBackend,
    id: &ResourceId,
    identifier: &str,
) -> Result<(), String> {
    let mut state = read_state_file(backend).await?;
    if let Some(existing) = state.find(id) {
        return Err(format!(
            "{} is already managed ({})",
            id,
            existing.identifier.as_deref().unwrap_or("no identifier")
        ));
    }

    let ctx = context_for(
        provider,
        Operation::Import,
        id,
        false,
        &TimeoutOverrides::default(),
    );
    let imported = provider
        .import(&ctx, id, identifier)
        .await
        .map_err(|e| format!("Import failed: {}", e))?;

    state.record(&imported, provider.name());
    write_state_file(backend, &mut state).await?;

    println!(
        "{}",
        format!("✓ Imported {} ({})", id, identifier).green().bold()
    );
    Ok(())
}

async fn run_state_list(file: &Path) -> Result<(), String> {
    let config = ConfigFile::load(file)?;
    let backend = create_backend(&config.backend);
    let state = read_state_file(backend.as_ref()).await?;

    for line in state_list_lines(&state) {
        println!("{}", line);
    }
    Ok(())
}

fn state_list_lines(state: &StateFile) -> Vec<String> {
    let mut entries: Vec<_> = state
        .resources
        .iter()
        .map(|r| {
            (
                resources::rank(&r.resource_type),
                r.id().to_string(),
                r.identifier.clone().unwrap_or_default(),
            )
        })
        .collect();
    entries.sort();
    entries
        .into_iter()
        .map(|(_, id, identifier)| format!("{}\t{}", id, identifier))
        .collect()
}

fn print_plan(plan: &Plan, schemas: &HashMap<String, ResourceSchema>) {
    if plan.is_empty() {
        println!("{}", "No changes. Infrastructure is up-to-date.".green());
        return;
    }

    println!("{}", "Execution Plan:".cyan().bold());
    println!();

    for effect in plan.effects() {
        let id = effect.resource_id();
        let schema = schemas.get(&id.resource_type);
        match effect {
            Effect::Read(_) => {
                println!("  {} {} (data source)", "<=".cyan().bold(), id);
            }
            Effect::Create(resource) => {
                println!("  {} {}", "+".green().bold(), id.to_string().cyan().bold());
                for (key, value) in sorted(&resource.attributes) {
                    println!(
                        "      {}: {}",
                        key,
                        display_value(schema, key, value).green()
                    );
                }
            }
            Effect::Update {
                from,
                to,
                changed_attributes,
                ..
            }
            | Effect::Replace {
                from,
                to,
                changed_attributes,
                ..
            } => {
                let symbol = if matches!(effect, Effect::Replace { .. }) {
                    "-/+".red().bold()
                } else {
                    "~".yellow().bold()
                };
                println!("  {} {}", symbol, id.to_string().cyan().bold());
                for key in changed_attributes {
                    let old = from
                        .attributes
                        .get(key)
                        .map(|v| display_value(schema, key, v))
                        .unwrap_or_else(|| "(none)".to_string());
                    let new = to
                        .attributes
                        .get(key)
                        .map(|v| display_value(schema, key, v))
                        .unwrap_or_else(|| "(none)".to_string());
                    let force = if schema.is_some_and(|s| s.is_force_new(key)) {
                        " (forces replacement)"
                    } else {
                        ""
                    };
                    println!("      {}: {} → {}{}", key, old.red(), new.green(), force);
                }
            }
            Effect::Delete { .. } => {
                println!("  {} {}", "-".red().bold(), id.to_string().red().bold());
            }
        }
    }

    println!();
    let summary = plan.summary();
    println!(
        "Plan: {} to create, {} to update, {} to replace, {} to delete.",
        summary.create.to_string().green(),
        summary.update.to_string().yellow(),
        summary.replace.to_string().red(),
        summary.delete.to_string().red()
    );
}

fn print_data_source(state: &State) {
    println!("  {} {}", "<=".cyan().bold(), state.id.to_string().cyan().bold());
    let schemas = get_data_source_schemas();
    for line in data_source_lines(state, schemas.get(&state.id.resource_type)) {
        println!("      {}", line);
    }
}

/// Attributes read from a data source, sorted by key with sensitive values
/// masked
fn data_source_lines(state: &State, schema: Option<&ResourceSchema>) -> Vec<String> {
    sorted(&state.attributes)
        .into_iter()
        .map(|(key, value)| format!("{}: {}", key, display_value(schema, key, value)))
        .collect()
}

fn sorted(attributes: &HashMap<String, Value>) -> Vec<(&String, &Value)> {
    let mut entries: Vec<_> = attributes.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

fn format_effect(effect: &Effect) -> String {
    match effect {
        Effect::Read(r) => format!("Read {}", r.id),
        Effect::Create(r) => format!("Create {}", r.id),
        Effect::Update { id, .. } => format!("Update {}", id),
        Effect::Replace { id, .. } => format!("Replace {}", id),
        Effect::Delete { id, .. } => format!("Delete {}", id),
    }
}

fn display_value(schema: Option<&ResourceSchema>, key: &str, value: &Value) -> String {
    if schema.is_some_and(|s| s.is_sensitive(key)) {
        "(sensitive)".to_string()
    } else {
        format_value(value)
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Int(i) => i.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::List(items) => {
            let inner: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Map(map) => {
            let inner: Vec<String> = sorted(map)
                .into_iter()
                .map(|(k, v)| format!("{} = {}", k, format_value(v)))
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use azurerm_core::provider::{BoxFuture, ProviderError, ProviderResult, ResourceType};
    use azurerm_core::schema::TypeError;
    use azurerm_state::LocalBackend;

    #[test]
    fn format_value_renders_nested_maps_in_key_order() {
        let value = Value::Map(HashMap::from([
            ("b".to_string(), Value::List(vec![Value::Int(1), Value::Bool(true)])),
            ("a".to_string(), Value::String("x".to_string())),
        ]));
        assert_eq!(format_value(&value), r#"{a = "x", b = [1, true]}"#);
    }

    #[test]
    fn sensitive_values_are_masked() {
        let schemas = get_schemas();
        let schema = schemas.get("relay_namespace");
        let key = Value::String("c2VjcmV0".to_string());
        assert_eq!(display_value(schema, "primary_key", &key), "(sensitive)");
        assert_eq!(
            display_value(schema, "location", &Value::String("westeurope".to_string())),
            "\"westeurope\""
        );
    }

    #[test]
    fn resources_sorted_by_dependency() {
        let sorted = sort_resources(vec![
            Resource::new("relay_hybrid_connection_authorization_rule", "rule"),
            Resource::new("relay_hybrid_connection", "hc"),
            Resource::new("relay_namespace", "lookup").with_read_only(true),
            Resource::new("relay_namespace", "ns"),
        ]);
        let names: Vec<&str> = sorted.iter().map(|r| r.id.name.as_str()).collect();
        assert_eq!(names, vec!["lookup", "ns", "hc", "rule"]);
    }

    #[test]
    fn validate_resources_reports_every_error() {
        let resources = vec![
            Resource::new("relay_namespace", "bad")
                .with_attribute("name", Value::String("x".to_string())),
            Resource::new("relay_unknown", "other"),
        ];
        let errors = validate_resources(&resources).unwrap_err();
        assert!(errors.contains("relay_namespace.bad:"));
        assert!(errors.contains("relay_unknown.other:"));
    }

    #[test]
    fn timeouts_follow_type_defaults_and_overrides() {
        let provider = AzurermProvider::with_clients(test_clients());
        let id = ResourceId::new("relay_namespace", "ns");
        assert_eq!(
            operation_timeout(
                &provider,
                &id,
                false,
                &TimeoutOverrides::default(),
                Operation::Create
            ),
            Duration::from_secs(60 * 60)
        );
        assert_eq!(
            operation_timeout(
                &provider,
                &id,
                true,
                &TimeoutOverrides::default(),
                Operation::Read
            ),
            Duration::from_secs(5 * 60)
        );
        let overrides = TimeoutOverrides {
            delete: Some(Duration::from_secs(10)),
            ..Default::default()
        };
        assert_eq!(
            operation_timeout(&provider, &id, false, &overrides, Operation::Delete),
            Duration::from_secs(10)
        );
    }

    #[tokio::test]
    async fn state_list_orders_parents_first() {
        let dir = tempfile::TempDir::new().unwrap();
        let backend = LocalBackend::new(dir.path().join("azurerm.state.json"));

        let mut state = StateFile::new();
        for (resource_type, name, identifier) in [
            ("relay_hybrid_connection", "hc", "/hc"),
            ("relay_namespace", "ns", "/ns"),
        ] {
            state.record(
                &State::existing(ResourceId::new(resource_type, name), HashMap::new())
                    .with_identifier(identifier),
                "azurerm",
            );
        }
        write_state_file(&backend, &mut state).await.unwrap();

        let state = read_state_file(&backend).await.unwrap();
        assert_eq!(state.serial, 1);
        assert_eq!(
            state_list_lines(&state),
            vec![
                "relay_namespace.ns\t/ns".to_string(),
                "relay_hybrid_connection.hc\t/hc".to_string(),
            ]
        );
    }

    #[test]
    fn data_source_output_masks_keys() {
        let schemas = get_data_source_schemas();
        let state = State::existing(
            ResourceId::new("relay_namespace", "lookup"),
            HashMap::from([
                ("primary_key".to_string(), Value::String("c2VjcmV0".to_string())),
                ("location".to_string(), Value::String("westeurope".to_string())),
            ]),
        );
        assert_eq!(
            data_source_lines(&state, schemas.get("relay_namespace")),
            vec![
                "location: \"westeurope\"".to_string(),
                "primary_key: (sensitive)".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn replace_records_deletion_when_create_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let backend = LocalBackend::new(dir.path().join("azurerm.state.json"));

        let id = ResourceId::new("relay_namespace", "ns");
        let mut state = StateFile::new();
        state.record(
            &State::existing(id.clone(), HashMap::new()).with_identifier("/old"),
            "azurerm",
        );

        let effect = Effect::Replace {
            id: id.clone(),
            identifier: "/old".to_string(),
            from: State::existing(id.clone(), HashMap::new()),
            to: Resource::new("relay_namespace", "ns"),
            changed_attributes: vec!["location".to_string()],
        };
        let provider = FailingCreateProvider;
        let mut writer = StateWriter::new(&backend, state, "azurerm");
        let result = apply_effect(&provider, &effect, &mut writer).await;

        assert!(result.unwrap_err().contains("create rejected"));
        assert!(writer.state.find(&id).is_none());
        let persisted = read_state_file(&backend).await.unwrap();
        assert!(persisted.find(&id).is_none());
    }

    /// Deletes succeed, creates fail
    struct FailingCreateProvider;

    impl Provider for FailingCreateProvider {
        fn name(&self) -> &'static str {
            "azurerm"
        }

        fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
            Vec::new()
        }

        fn validate(&self, _resource: &Resource) -> Result<(), Vec<TypeError>> {
            Ok(())
        }

        fn read(
            &self,
            _ctx: &OperationContext,
            id: &ResourceId,
            _identifier: Option<&str>,
        ) -> BoxFuture<'_, ProviderResult<State>> {
            let id = id.clone();
            Box::pin(async move { Ok(State::not_found(id)) })
        }

        fn read_data_source(
            &self,
            _ctx: &OperationContext,
            resource: &Resource,
        ) -> BoxFuture<'_, ProviderResult<State>> {
            let id = resource.id.clone();
            Box::pin(async move { Ok(State::not_found(id)) })
        }

        fn create(
            &self,
            _ctx: &OperationContext,
            _resource: &Resource,
        ) -> BoxFuture<'_, ProviderResult<State>> {
            Box::pin(async { Err(ProviderError::api("create rejected")) })
        }

        fn update(
            &self,
            _ctx: &OperationContext,
            _id: &ResourceId,
            _identifier: &str,
            _from: &State,
            _to: &Resource,
        ) -> BoxFuture<'_, ProviderResult<State>> {
            Box::pin(async { Err(ProviderError::api("update rejected")) })
        }

        fn delete(
            &self,
            _ctx: &OperationContext,
            _id: &ResourceId,
            _identifier: &str,
        ) -> BoxFuture<'_, ProviderResult<()>> {
            Box::pin(async { Ok(()) })
        }

        fn import(
            &self,
            _ctx: &OperationContext,
            id: &ResourceId,
            _identifier: &str,
        ) -> BoxFuture<'_, ProviderResult<State>> {
            let id = id.clone();
            Box::pin(async move { Ok(State::not_found(id)) })
        }
    }

    fn test_clients() -> azurerm_provider::Clients {
        use azurerm_provider::arm::{ArmClient, StaticToken};
        use std::sync::Arc;

        let arm = ArmClient::new(
            ArmClient::http_client().unwrap(),
            "http://127.0.0.1:1/",
            Arc::new(StaticToken::new("token")),
        )
        .unwrap();
        azurerm_provider::Clients::from_arm("sub", Duration::from_secs(15), arm)
    }
}
