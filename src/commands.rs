//! Subcommands and their handlers

use chrono::{Local, NaiveDate};
use clap::{Args, Subcommand, ValueEnum};
use color_eyre::{eyre::eyre, Result};
use inquire::{Confirm, Select, Text};
use std::path::PathBuf;
use tracing::info;

use crate::app::App;
use crate::cache::LocalCache;
use crate::export;
use crate::filter::{unique_services, SortField, SortOrder, VoucherFilter};
use crate::model::{ListAction, ListKind, ViewMode, Voucher, VoucherDraft};
use crate::printout;
use crate::views;

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Voucher dashboard with filters
  #[command(alias = "ls")]
  List(FilterArgs),

  /// Show a voucher as a printable work order
  Show { number: u32 },

  /// Write the printable HTML document for a voucher
  Print {
    number: u32,

    /// Output file (default: Voucher_<number>.html)
    #[arg(short, long)]
    output: Option<PathBuf>,
  },

  /// Issue a new voucher; missing supplier or service is prompted for
  #[command(alias = "new")]
  Create(DraftArgs),

  /// Change the fields of an existing voucher
  Edit {
    number: u32,

    #[command(flatten)]
    fields: DraftArgs,
  },

  /// Copy a voucher under the next voucher number
  #[command(alias = "dup")]
  Duplicate { number: u32 },

  /// Delete a voucher
  #[command(alias = "rm")]
  Delete {
    number: u32,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,
  },

  /// Show or manage the service, supplier and guide lists
  Lists {
    #[command(subcommand)]
    action: Option<ListCommand>,
  },

  /// Export vouchers to CSV
  Export {
    /// Output file (default: vouchers_export_<date>.csv)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    filter: FilterArgs,
  },

  /// Return to the screen of the last session
  Resume,

  /// Reload from the remote store and refresh the local cache
  Sync,
}

#[derive(Subcommand, Debug)]
pub enum ListCommand {
  /// Print one list, or all of them
  Show { kind: Option<ListKind> },
  Add { kind: ListKind, name: String },
  #[command(alias = "rm")]
  Delete { kind: ListKind, name: String },
  Rename { kind: ListKind, old: String, new: String },
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
  /// Earliest date of service (YYYY-MM-DD)
  #[arg(long)]
  from: Option<NaiveDate>,

  /// Latest date of service (YYYY-MM-DD)
  #[arg(long)]
  to: Option<NaiveDate>,

  /// Exact service type
  #[arg(long)]
  service: Option<String>,

  /// Part of the guide name
  #[arg(long)]
  guide: Option<String>,

  #[arg(long, value_enum, default_value_t = SortKey::Date)]
  sort: SortKey,

  /// Ascending order (default is descending)
  #[arg(long)]
  asc: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
  Number,
  #[default]
  Date,
}

impl From<FilterArgs> for VoucherFilter {
  fn from(args: FilterArgs) -> Self {
    Self {
      from: args.from,
      to: args.to,
      service: args.service,
      guide: args.guide,
      sort_by: match args.sort {
        SortKey::Number => SortField::VoucherNumber,
        SortKey::Date => SortField::DateOfService,
      },
      order: if args.asc { SortOrder::Asc } else { SortOrder::Desc },
    }
  }
}

/// Voucher form fields; anything left out keeps its current value
#[derive(Args, Debug, Clone, Default)]
pub struct DraftArgs {
  /// Supplier or site the voucher is addressed to
  #[arg(long = "to")]
  supplier: Option<String>,

  #[arg(long)]
  service: Option<String>,

  /// Date of service (YYYY-MM-DD, default today)
  #[arg(long)]
  date: Option<String>,

  /// Visit time (HH:MM); pass an empty value to clear it
  #[arg(long)]
  time: Option<String>,

  #[arg(long)]
  tour: Option<String>,

  #[arg(long)]
  travelers: Option<u32>,

  #[arg(long)]
  description: Option<String>,

  #[arg(long)]
  guide: Option<String>,
}

impl DraftArgs {
  /// Overlay the given fields onto `draft`
  fn apply(self, mut draft: VoucherDraft) -> VoucherDraft {
    if let Some(v) = self.supplier {
      draft.to = v;
    }
    if let Some(v) = self.service {
      draft.service_type = v;
    }
    if let Some(v) = self.date {
      draft.date_of_service = v;
    }
    if let Some(v) = self.time {
      draft.visit_time = Some(v).filter(|t| !t.trim().is_empty());
    }
    if let Some(v) = self.tour {
      draft.tour_number = v;
    }
    if let Some(v) = self.travelers {
      draft.number_of_travelers = v;
    }
    if let Some(v) = self.description {
      draft.service_description = v;
    }
    if let Some(v) = self.guide {
      draft.guide_name = v;
    }
    draft
  }
}

pub async fn run<C: LocalCache>(app: &mut App<C>, command: Command) -> Result<()> {
  match command {
    Command::List(filter) => list(app, filter.into()),
    Command::Show { number } => {
      let id = app.voucher_by_number(number)?.id;
      show(app, id)
    }
    Command::Print { number, output } => print(app, number, output),
    Command::Create(fields) => create(app, fields).await,
    Command::Edit { number, fields } => edit(app, number, fields).await,
    Command::Duplicate { number } => {
      let id = app.voucher_by_number(number)?.id;
      let copy = app.duplicate(id).await?;
      println!("Voucher #{} duplicated as #{}", number, copy.voucher_number);
      println!("{}", printout::render_text(&copy));
      Ok(())
    }
    Command::Delete { number, yes } => delete(app, number, yes).await,
    Command::Lists { action } => {
      lists(app, action.unwrap_or(ListCommand::Show { kind: None })).await
    }
    Command::Export { output, filter } => export_csv(app, output, filter.into()),
    Command::Resume => resume(app),
    Command::Sync => {
      if !app.has_remote() {
        println!("No remote store configured; using the local cache.");
      }
      let source = app.reload().await;
      println!(
        "Loaded {} vouchers from the {}.",
        app.state().vouchers.len(),
        source.describe()
      );
      Ok(())
    }
  }
}

fn list<C: LocalCache>(app: &mut App<C>, filter: VoucherFilter) -> Result<()> {
  let last_active = app.session().last_active_voucher_id;
  app.set_view(ViewMode::Dashboard, None);
  let state = app.state();

  if let Some(service) = filter.service.as_deref() {
    let in_use = unique_services(&state.vouchers);
    if !in_use.iter().any(|s| s == service) {
      println!("No voucher uses service '{}'. In use: {}", service, in_use.join(", "));
      return Ok(());
    }
  }

  let vouchers = filter.apply(&state.vouchers);
  if vouchers.is_empty() {
    println!("No vouchers found.");
  } else {
    println!("{}", views::voucher_table(&vouchers, last_active));
  }
  println!(
    "{} of {} vouchers | next #{} | {}",
    vouchers.len(),
    state.vouchers.len(),
    state.next_voucher_number,
    app.source().describe()
  );
  Ok(())
}

fn show<C: LocalCache>(app: &mut App<C>, id: i64) -> Result<()> {
  app.set_view(ViewMode::Preview, Some(id));
  let voucher = app
    .active_voucher()
    .ok_or_else(|| eyre!("Voucher {} not found", id))?;
  println!("{}", printout::render_text(voucher));
  Ok(())
}

fn print<C: LocalCache>(app: &mut App<C>, number: u32, output: Option<PathBuf>) -> Result<()> {
  let voucher = app.voucher_by_number(number)?.clone();
  let html = printout::render_html(&voucher)?;
  let path = output.unwrap_or_else(|| {
    PathBuf::from(printout::pdf_file_name(&voucher)).with_extension("html")
  });

  std::fs::write(&path, html)
    .map_err(|e| eyre!("Failed to generate PDF document {}: {}", path.display(), e))?;
  info!(
    path = %path.display(),
    element = printout::DOCUMENT_ELEMENT_ID,
    options = ?printout::PDF_OPTIONS,
    "Printable voucher written"
  );

  app.set_view(ViewMode::Preview, Some(voucher.id));
  println!("Wrote {}", path.display());
  Ok(())
}

async fn create<C: LocalCache>(app: &mut App<C>, mut fields: DraftArgs) -> Result<()> {
  if fields.supplier.is_none() {
    fields.supplier = Some(prompt_entry(app, ListKind::Supplier)?);
  }
  if fields.service.is_none() {
    fields.service = Some(prompt_entry(app, ListKind::Service)?);
  }

  let draft = VoucherDraft {
    date_of_service: Local::now().date_naive().format("%Y-%m-%d").to_string(),
    ..VoucherDraft::default()
  };
  let voucher = app.submit(fields.apply(draft), None).await?;

  println!("Voucher #{} generated", voucher.voucher_number);
  println!("{}", printout::render_text(&voucher));
  Ok(())
}

async fn edit<C: LocalCache>(app: &mut App<C>, number: u32, fields: DraftArgs) -> Result<()> {
  let existing = app.voucher_by_number(number)?.clone();
  let draft = fields.apply(VoucherDraft::from_voucher(&existing));
  let voucher = app.submit(draft, Some(existing.id)).await?;

  println!("Voucher #{} updated", voucher.voucher_number);
  println!("{}", printout::render_text(&voucher));
  Ok(())
}

async fn delete<C: LocalCache>(app: &mut App<C>, number: u32, yes: bool) -> Result<()> {
  let id = app.voucher_by_number(number)?.id;

  if !yes {
    let confirmed = Confirm::new(&format!(
      "Are you sure you want to delete voucher #{}?",
      number
    ))
    .with_default(false)
    .prompt()
    .map_err(|e| eyre!("Prompt failed: {}", e))?;
    if !confirmed {
      println!("Cancelled.");
      return Ok(());
    }
  }

  let removed: Voucher = app.delete(id).await?;
  println!("Voucher #{} deleted", removed.voucher_number);
  Ok(())
}

async fn lists<C: LocalCache>(app: &mut App<C>, action: ListCommand) -> Result<()> {
  let (kind, name, action) = match action {
    ListCommand::Show { kind } => {
      app.set_view(ViewMode::Manage, None);
      let kinds = match kind {
        Some(kind) => vec![kind],
        None => ListKind::ALL.to_vec(),
      };
      println!("{}", views::lists_table(app.state(), &kinds));
      return Ok(());
    }
    ListCommand::Add { kind, name } => (kind, name, ListAction::Add),
    ListCommand::Delete { kind, name } => (kind, name, ListAction::Delete),
    ListCommand::Rename { kind, old, new } => (kind, new, ListAction::Rename { from: old }),
  };

  app.set_view(ViewMode::Manage, None);
  if app.list_action(kind, &name, action).await? {
    println!("{} updated", kind.title());
  } else {
    println!("{} unchanged", kind.title());
  }
  println!("{}", views::lists_table(app.state(), &[kind]));
  Ok(())
}

fn export_csv<C: LocalCache>(
  app: &App<C>,
  output: Option<PathBuf>,
  filter: VoucherFilter,
) -> Result<()> {
  let Some(csv) = export::to_csv(filter.apply(&app.state().vouchers))? else {
    println!("No vouchers to export.");
    return Ok(());
  };

  let path = output
    .unwrap_or_else(|| PathBuf::from(export::default_file_name(Local::now().date_naive())));
  std::fs::write(&path, csv)
    .map_err(|e| eyre!("Failed to write {}: {}", path.display(), e))?;
  info!(path = %path.display(), "Vouchers exported");
  println!("Exported to {}", path.display());
  Ok(())
}

/// Pick up where the last session left off
fn resume<C: LocalCache>(app: &mut App<C>) -> Result<()> {
  let view = app.session().last_view;
  let active = app.active_voucher().map(|v| (v.id, v.voucher_number));

  match (view, active) {
    (ViewMode::Preview, Some((id, _))) => show(app, id),
    (ViewMode::Edit, Some((id, number))) => {
      println!("Last edited voucher #{}; change it with `edit {}`.", number, number);
      show(app, id)?;
      app.set_view(ViewMode::Edit, Some(id));
      Ok(())
    }
    (ViewMode::Manage, _) => {
      app.set_view(ViewMode::Manage, None);
      println!("{}", views::lists_table(app.state(), &ListKind::ALL));
      Ok(())
    }
    _ => list(app, VoucherFilter::default()),
  }
}

/// Ask for a supplier or service; the known entries come first
fn prompt_entry<C: LocalCache>(app: &App<C>, kind: ListKind) -> Result<String> {
  const OTHER: &str = "Other...";
  let label = match kind {
    ListKind::Supplier => "To (supplier / site):",
    ListKind::Service => "Service type:",
    ListKind::Guide => "Guide:",
  };

  let mut options: Vec<String> = app.state().list(kind).to_vec();
  let choice = if options.is_empty() {
    OTHER.to_string()
  } else {
    options.push(OTHER.to_string());
    Select::new(label, options)
      .prompt()
      .map_err(|e| eyre!("Prompt failed: {}", e))?
  };

  if choice != OTHER {
    return Ok(choice);
  }
  Text::new(label)
    .prompt()
    .map_err(|e| eyre!("Prompt failed: {}", e))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::tests_support::voucher;

  #[test]
  fn test_draft_args_overlay() {
    let existing = voucher(1, 8000);
    let args = DraftArgs {
      guide: Some("Avi".to_string()),
      time: Some(String::new()),
      travelers: Some(9),
      ..Default::default()
    };

    let draft = args.apply(VoucherDraft::from_voucher(&existing));
    assert_eq!(draft.guide_name, "Avi");
    assert_eq!(draft.visit_time, None);
    assert_eq!(draft.number_of_travelers, 9);
    assert_eq!(draft.to, existing.to);
    assert_eq!(draft.date_of_service, existing.date_of_service);
  }

  #[test]
  fn test_filter_args_conversion() {
    let args = FilterArgs {
      sort: SortKey::Number,
      asc: true,
      guide: Some("dana".to_string()),
      ..Default::default()
    };
    let filter = VoucherFilter::from(args);
    assert_eq!(filter.sort_by, SortField::VoucherNumber);
    assert_eq!(filter.order, SortOrder::Asc);
    assert_eq!(filter.guide.as_deref(), Some("dana"));

    let defaults = VoucherFilter::from(FilterArgs::default());
    assert_eq!(defaults.sort_by, SortField::DateOfService);
    assert_eq!(defaults.order, SortOrder::Desc);
  }
}
