use std::fs;
use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result, WrapErr};

use semgit_core::{OutputFormat, SemgitConfig};
use semgit_impact::{load_rules, resolve_all};
use semgit_meta::{MetaRecord, MetaStore, MetaSummary};
use semgit_semantic::{aggregate, draft_message, has_meaningful_content};
use semgit_vcs::{Repository, TreeRef};

#[derive(Parser)]
#[command(
    name = "semgit",
    version,
    about = "Semantic change intelligence for git workflows",
    long_about = "semgit augments a git workflow with structural change analysis.\n\n\
                  It diffs tree snapshots, counts declaration-level deltas, classifies\n\
                  the change, drafts commit messages, records per-commit metadata, and\n\
                  maps changed sources to likely-impacted tests.\n\n\
                  Examples:\n  \
                    semgit describe --since HEAD~3     Summarize changes since a ref\n  \
                    semgit diff                        Semantic summary of staged changes\n  \
                    semgit impacted --only-existing    List tests touched by a change\n  \
                    semgit meta show last              Show the latest commit record\n  \
                    semgit setup                       Install the git hooks"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Output format (md or json)
    #[arg(long, global = true, default_value = "md")]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize changes between a ref and HEAD
    #[command(long_about = "Summarize changes between a ref and HEAD.\n\n\
        Diffs the ref's tree against HEAD's tree with rename detection, counts\n\
        files by language and top-level directory, and sums structural deltas\n\
        for recognized source files. An unresolvable ref compares against the\n\
        empty tree, so the first commit is summarized as all-added.\n\n\
        Examples:\n  semgit describe\n  semgit describe --since v1.2.0 --format json")]
    Describe {
        /// Compare this ref's tree to HEAD
        #[arg(long, default_value = "HEAD~1")]
        since: String,

        /// Repository path (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
    /// Show a semantic summary of staged changes
    #[command(long_about = "Show a semantic summary of staged changes.\n\n\
        Compares the index against the committed HEAD tree (or against a ref\n\
        with --since) and reports file counts plus the full structural delta.\n\n\
        Examples:\n  semgit diff\n  semgit diff --since HEAD~2 --no-semantic")]
    Diff {
        /// Compare since this ref instead of HEAD
        #[arg(long)]
        since: Option<String>,

        /// Skip the structural delta
        #[arg(long)]
        no_semantic: bool,

        /// Repository path (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
    /// List tests likely impacted by changes since a ref
    #[command(long_about = "List tests likely impacted by changes since a ref.\n\n\
        Applies the ordered rules from the impact rule file (first match wins),\n\
        then the src/main/java -> src/test/java naming convention. Results are\n\
        deduplicated in first-seen order.\n\n\
        Examples:\n  semgit impacted\n  semgit impacted --since HEAD~5 --only-existing")]
    Impacted {
        /// Compare this ref's tree to HEAD
        #[arg(long, default_value = "HEAD~1")]
        since: String,

        /// Only list tests that exist on disk
        #[arg(long)]
        only_existing: bool,

        /// Repository path (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
    /// Inspect the per-commit metadata log
    Meta {
        #[command(subcommand)]
        command: MetaCommand,
    },
    /// Internal hook entry points (never fail the host commit)
    #[command(subcommand)]
    Hook(HookCommand),
    /// Install git hooks and prepare the .semgit directory
    #[command(long_about = "Install git hooks and prepare the .semgit directory.\n\n\
        Writes thin prepare-commit-msg, commit-msg, and post-commit hook scripts\n\
        that re-invoke this binary, and adds .semgit/ to .gitignore.")]
    Setup {
        /// Repository path (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
    /// Check hook installation and config presence
    #[command(long_about = "Check hook installation and config presence.\n\n\
        Reports whether the hook scripts, configuration file, and impact rule\n\
        file are in place, and suggests running setup when hooks are missing.\n\
        Read-only; changes nothing.")]
    Verify {
        /// Repository path (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
}

#[derive(Subcommand)]
enum MetaCommand {
    /// Show one stored record (a commit id, or "last")
    Show {
        /// Commit id to look up
        #[arg(default_value = "last")]
        commit: String,

        /// Repository path (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
    /// Export the whole log as CSV
    ExportCsv {
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Repository path (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
}

#[derive(Subcommand)]
enum HookCommand {
    /// Prepopulate the commit message before the editor opens
    PrepareCommitMsg {
        /// Path to the message file git passes to the hook
        message_file: PathBuf,
        /// Message source (message, template, merge, squash, commit)
        source: Option<String>,
        /// Commit sha for amend flows
        sha: Option<String>,
    },
    /// Draft a commit message if the file is still empty
    CommitMsg {
        /// Path to COMMIT_EDITMSG
        message_file: PathBuf,
    },
    /// Append metadata for the latest commit
    PostCommit,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();

    match cli.command {
        Command::Describe { since, path } => run_describe(&path, &since, cli.format)?,
        Command::Diff {
            since,
            no_semantic,
            path,
        } => run_diff(&path, since.as_deref(), !no_semantic)?,
        Command::Impacted {
            since,
            only_existing,
            path,
        } => run_impacted(&path, &since, only_existing)?,
        Command::Meta { command } => match command {
            MetaCommand::Show { commit, path } => run_meta_show(&path, &commit)?,
            MetaCommand::ExportCsv { output, path } => run_meta_export(&path, output.as_deref())?,
        },
        Command::Hook(hook) => {
            // Hook stages return Result like everything else; this is the
            // one place errors are logged and discarded so a failing
            // pipeline can never block the host commit.
            let outcome = match hook {
                HookCommand::PrepareCommitMsg { message_file, .. }
                | HookCommand::CommitMsg { message_file } => hook_draft_message(&message_file),
                HookCommand::PostCommit => hook_post_commit(),
            };
            if let Err(err) = outcome {
                eprintln!("semgit hook: {err} (ignored)");
            }
        }
        Command::Setup { path } => run_setup(&path)?,
        Command::Verify { path } => run_verify(&path)?,
    }

    Ok(())
}

fn run_describe(path: &Path, since: &str, format: OutputFormat) -> Result<()> {
    let repo = Repository::discover(path)?;
    let to = repo.head_tree().wrap_err("describe needs at least one commit")?;
    let from = repo.resolve_tree(since);
    let records = repo.diff(from, to)?;

    let config = SemgitConfig::load_or_default(&repo.root());
    let summary = aggregate(&records, &repo, &config);

    match format {
        OutputFormat::Json => {
            #[derive(serde::Serialize)]
            #[serde(rename_all = "camelCase")]
            struct Range<'a> {
                since: &'a str,
                to: &'a str,
            }
            #[derive(serde::Serialize)]
            #[serde(rename_all = "camelCase")]
            struct Report<'a> {
                range: Range<'a>,
                #[serde(flatten)]
                summary: &'a semgit_core::AggregatedSummary,
            }
            let report = Report {
                range: Range { since, to: "HEAD" },
                summary: &summary,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&report).into_diagnostic()?
            );
        }
        OutputFormat::Markdown => {
            println!("# Change Summary");
            println!("- Range: `{since}` -> `HEAD`");
            println!(
                "- Files: +{} ~{} -{}",
                summary.files_added, summary.files_modified, summary.files_deleted
            );
            println!(
                "- Structural delta: types={}, methods={}",
                summary.structural.types_total(),
                summary.structural.methods
            );
            if !summary.by_language.is_empty() {
                println!("\n## Files by language");
                for (label, count) in summary.by_language.iter() {
                    println!("- {label}: {count}");
                }
            }
            if !summary.by_directory.is_empty() {
                println!("\n## Top-level directories touched");
                for (label, count) in summary.by_directory.iter() {
                    println!("- {label}: {count}");
                }
            }
        }
    }
    Ok(())
}

fn run_diff(path: &Path, since: Option<&str>, semantic: bool) -> Result<()> {
    let repo = Repository::discover(path)?;
    let records = match since {
        Some(since) => {
            let from = repo.resolve_tree(since);
            let to = repo.index_tree()?;
            repo.diff(from, to)?
        }
        None => repo.diff_staged()?,
    };

    let config = SemgitConfig::load_or_default(&repo.root());
    let summary = aggregate(&records, &repo, &config);

    println!(
        "Files: +{} ~{} -{}",
        summary.files_added, summary.files_modified, summary.files_deleted
    );
    if semantic {
        let s = &summary.structural;
        println!(
            "Structural: classes={}, interfaces={}, enums={}, methods={}, fields={}",
            s.types, s.interfaces, s.enums, s.methods, s.fields
        );
    }
    Ok(())
}

fn run_impacted(path: &Path, since: &str, only_existing: bool) -> Result<()> {
    let repo = Repository::discover(path)?;
    let to = repo.head_tree().wrap_err("impacted needs at least one commit")?;
    let from = repo.resolve_tree(since);
    let records = repo.diff(from, to)?;

    let root = repo.root();
    let config = SemgitConfig::load_or_default(&root);
    let rules = load_rules(&root.join(&config.impacted_rules));

    let changed = records.iter().filter_map(|r| r.path());
    let mut tests = resolve_all(changed, &rules);
    if only_existing {
        tests.retain(|t| root.join(t).exists());
    }

    if tests.is_empty() {
        println!("(no obvious tests)");
    } else {
        for test in tests {
            println!("{test}");
        }
    }
    Ok(())
}

fn run_meta_show(path: &Path, commit: &str) -> Result<()> {
    let repo = Repository::discover(path)?;
    let store = MetaStore::in_repo(&repo.root());
    let record = if commit == "last" {
        store.read_last()?
    } else {
        store.find(commit)?
    };
    match record {
        Some(record) => println!(
            "{}",
            serde_json::to_string_pretty(&record).into_diagnostic()?
        ),
        None => println!("No metadata."),
    }
    Ok(())
}

fn run_meta_export(path: &Path, output: Option<&Path>) -> Result<()> {
    let repo = Repository::discover(path)?;
    let store = MetaStore::in_repo(&repo.root());
    let rows = store.export_csv()?;
    match output {
        Some(target) => {
            fs::write(target, rows.join("\n") + "\n")
                .into_diagnostic()
                .wrap_err(format!("writing {}", target.display()))?;
            eprintln!("wrote {} rows to {}", rows.len() - 1, target.display());
        }
        None => {
            for row in rows {
                println!("{row}");
            }
        }
    }
    Ok(())
}

/// Shared body of the prepare-commit-msg and commit-msg hooks.
fn hook_draft_message(message_file: &Path) -> semgit_core::Result<()> {
    let current = fs::read_to_string(message_file).unwrap_or_default();
    if has_meaningful_content(&current) {
        return Ok(());
    }

    let repo = Repository::discover(Path::new("."))?;
    let records = repo.diff_staged()?;
    let config = SemgitConfig::load_or_default(&repo.root());
    let summary = aggregate(&records, &repo, &config);

    let message = draft_message(&summary, config.commit_template.as_deref());
    fs::write(message_file, message)?;
    Ok(())
}

fn hook_post_commit() -> semgit_core::Result<()> {
    let repo = Repository::discover(Path::new("."))?;
    let Some(head) = repo.head_commit()? else {
        return Ok(());
    };

    let from = head.parent_tree.map(TreeRef::Tree).unwrap_or(TreeRef::Empty);
    let records = repo.diff(from, TreeRef::Tree(head.tree))?;
    let config = SemgitConfig::load_or_default(&repo.root());
    let summary = aggregate(&records, &repo, &config);

    // Stamp the record with the commit's own time so re-running the hook
    // stays deterministic.
    let timestamp = Utc
        .timestamp_opt(head.time_epoch, 0)
        .single()
        .unwrap_or_else(Utc::now)
        .to_rfc3339();

    let record = MetaRecord {
        commit_id: head.id,
        timestamp,
        summary: MetaSummary::new(
            summary.files_added,
            summary.files_modified,
            summary.files_deleted,
            &summary.structural,
        ),
    };
    MetaStore::in_repo(&repo.root()).append(&record)?;
    println!("[semgit] post-commit: metadata recorded");
    Ok(())
}

fn run_setup(path: &Path) -> Result<()> {
    let repo = Repository::discover(path)?;
    let root = repo.root();
    fs::create_dir_all(root.join(".semgit")).into_diagnostic()?;
    let hooks = root.join(".git/hooks");
    fs::create_dir_all(&hooks).into_diagnostic()?;

    let exe = std::env::current_exe()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "semgit".into());

    for (hook, sh_args, bat_args) in [
        ("prepare-commit-msg", " \"$1\" \"$2\" \"$3\"", " %1 %2 %3"),
        ("commit-msg", " \"$1\"", " %1"),
        ("post-commit", "", ""),
    ] {
        let script = format!("#!/bin/sh\nexec \"{exe}\" hook {hook}{sh_args}\n");
        write_executable(&hooks.join(hook), &script)?;

        let bat = format!("@echo off\r\n\"{exe}\" hook {hook}{bat_args}\r\n");
        write_executable(&hooks.join(format!("{hook}.bat")), &bat)?;
    }

    ensure_gitignore_entry(&root)?;
    println!("semgit hooks installed under {}", hooks.display());
    Ok(())
}

fn run_verify(path: &Path) -> Result<()> {
    let repo = Repository::discover(path)?;
    let root = repo.root();
    let hooks = root.join(".git/hooks");

    println!("semgit verify:");
    println!("  repo root: {}", root.display());
    println!(
        "  hooks dir: {}  [{}]",
        hooks.display(),
        if hooks.is_dir() { "OK" } else { "MISSING" }
    );

    let mut all_installed = hooks.is_dir();
    for hook in ["prepare-commit-msg", "commit-msg", "post-commit"] {
        // Either the sh script or the .bat variant counts as installed.
        let installed =
            hooks.join(hook).exists() || hooks.join(format!("{hook}.bat")).exists();
        all_installed &= installed;
        println!(
            "  hook {hook}: {}",
            if installed { "OK" } else { "MISSING" }
        );
    }

    for file in ["config.json", "tests.map"] {
        let present = root.join(".semgit").join(file).exists();
        println!(
            "  .semgit/{file}: {}",
            if present { "present" } else { "optional (not found)" }
        );
    }

    if !all_installed {
        println!("  > Run: semgit setup (to install hooks)");
    }
    Ok(())
}

fn write_executable(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content)
        .into_diagnostic()
        .wrap_err(format!("writing {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).into_diagnostic()?;
    }
    Ok(())
}

fn ensure_gitignore_entry(root: &Path) -> Result<()> {
    let gitignore = root.join(".gitignore");
    let current = fs::read_to_string(&gitignore).unwrap_or_default();
    if !current.lines().any(|l| l.trim() == ".semgit/") {
        let mut updated = current;
        if !updated.is_empty() && !updated.ends_with('\n') {
            updated.push('\n');
        }
        updated.push_str(".semgit/\n");
        fs::write(&gitignore, updated).into_diagnostic()?;
    }
    Ok(())
}
