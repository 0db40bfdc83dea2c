use attrfilters::api::AttrFiltersApi;
use attrfilters::commands::{CmdMessage, MessageLevel};
use attrfilters::config::FilterConfig;
use attrfilters::dump::DumpOptions;
use attrfilters::error::Result;
use attrfilters::resolve::{AttributeCondition, OptionFilter, SearchConditions, VisibleAttributes};
use clap::Parser;
use colored::*;
use tracing_subscriber::EnvFilter;

mod args;
use args::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("attrfilters=debug")
        } else {
            EnvFilter::new("attrfilters=info")
        }
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(cli: &Cli) -> FilterConfig {
    let Some(dir) = cli.config.clone().or_else(FilterConfig::default_dir) else {
        return FilterConfig::default();
    };
    match FilterConfig::load(&dir) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable config");
            FilterConfig::default()
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli);
    let options = config.load_options(cli.data.clone(), cli.cats.clone(), cli.expand_db)?;

    let api = AttrFiltersApi::default();
    let imported = api.import(&options)?;

    match cli.command {
        Commands::Import { dump } => {
            print_messages(&imported.messages);
            if let Some(category_id) = dump {
                let options = DumpOptions {
                    only_category: Some(category_id),
                    max_lines: config.dump_max_lines,
                };
                handle_dump(&api, &options)
            } else {
                Ok(())
            }
        }
        Commands::Find {
            cid,
            attributes,
            page,
            filter,
            json,
        } => {
            let conditions = SearchConditions {
                category_ids: vec![cid],
                attributes: attributes
                    .iter()
                    .map(|a| a.parse::<AttributeCondition>())
                    .collect::<Result<_>>()?,
                page_size: page.unwrap_or(config.page_size),
                offset: 0,
                filters: filter
                    .map(|f| f.parse::<OptionFilter>())
                    .transpose()?
                    .into_iter()
                    .collect(),
            };
            handle_find(&api, &conditions, json)
        }
        Commands::Dump { cid, max_lines } => {
            let options = DumpOptions {
                only_category: cid,
                max_lines: max_lines.unwrap_or(config.dump_max_lines),
            };
            handle_dump(&api, &options)
        }
    }
}

fn handle_find(api: &AttrFiltersApi, conditions: &SearchConditions, json: bool) -> Result<()> {
    let result = api.find_visible(conditions)?;
    let Some(visible) = result.visible else {
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&visible)?);
        eprint_messages(&result.messages);
    } else {
        print_visible(&visible);
        print_messages(&result.messages);
    }
    Ok(())
}

fn handle_dump(api: &AttrFiltersApi, options: &DumpOptions) -> Result<()> {
    let result = api.dump(options)?;
    if let Some(text) = result.dump {
        print!("{}", text);
    }
    print_messages(&result.messages);
    Ok(())
}

fn print_visible(visible: &VisibleAttributes) {
    println!(
        "{}",
        format!(
            "{} attributes, {} pages of {} options",
            visible.attributes.len(),
            visible.pages,
            visible.page_size
        )
        .dimmed()
    );
    for attribute in &visible.attributes {
        println!(
            "{} {}",
            format!("[{:6}]", attribute.id).yellow(),
            attribute.title.bold()
        );
        for option in &attribute.options {
            println!("   - {} {}", format!("[{:6}]", option.id).dimmed(), option.title);
        }
    }
    if !visible.corrected.attributes.is_empty() {
        let selected: Vec<String> = visible
            .corrected
            .attributes
            .iter()
            .map(ToString::to_string)
            .collect();
        println!("{} {}", "selected:".dimmed(), selected.join(" "));
    }
}

fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
        }
    }
}

/// Keeps stdout clean for machine-readable output.
fn eprint_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => eprintln!("{}", message.content.dimmed()),
            MessageLevel::Success => eprintln!("{}", message.content.green()),
            MessageLevel::Warning => eprintln!("{}", message.content.yellow()),
        }
    }
}
