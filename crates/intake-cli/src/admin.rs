//! Staff commands against the authenticated admin API.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Subcommand};
use intake_core::{
  application::{Application, ApplicationStatus},
  export::ExportFormat,
  store::{ApplicationQuery, ExportFilter, SearchField, SortDirection, SortKey},
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::client::ApiClient;

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
  /// Search, filter and page through applications.
  List(ListArgs),
  /// Print one application with all of its children as JSON.
  Show { id: Uuid },
  /// Dump applications as CSV or JSON.
  Export {
    #[arg(long, value_parser = parse_enum::<ExportFormat>, default_value = "csv")]
    format:   ExportFormat,
    #[arg(long, value_parser = parse_enum::<ApplicationStatus>)]
    status:   Option<ApplicationStatus>,
    #[arg(long)]
    category: Option<String>,
    /// Write to a file instead of stdout.
    #[arg(short, long)]
    output:   Option<PathBuf>,
  },
  /// Publish an application, or withdraw it with `--off`.
  Public {
    id:  Uuid,
    #[arg(long)]
    off: bool,
  },
  /// Toggle an application in your favorites.
  Favorite { id: Uuid },
  /// List your favorites, most recent first.
  Favorites {
    #[arg(long)]
    limit:  Option<usize>,
    #[arg(long)]
    offset: Option<usize>,
  },
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
  #[arg(long)]
  search:           Option<String>,
  /// Restrict the search to `name`, `email` or `category`.
  #[arg(long, value_parser = parse_enum::<SearchField>)]
  search_field:     Option<SearchField>,
  #[arg(long)]
  limit:            Option<usize>,
  #[arg(long)]
  offset:           Option<usize>,
  /// `createdAt` or `name`.
  #[arg(long, value_parser = parse_enum::<SortKey>)]
  sort_by:          Option<SortKey>,
  /// `asc` or `desc`.
  #[arg(long, value_parser = parse_enum::<SortDirection>)]
  direction:        Option<SortDirection>,
  #[arg(long, value_parser = parse_enum::<ApplicationStatus>)]
  status:           Option<ApplicationStatus>,
  #[arg(long)]
  category:         Option<String>,
  #[arg(long)]
  with_skills:      bool,
  #[arg(long)]
  with_experiences: bool,
  #[arg(long)]
  with_socials:     bool,
  #[arg(long)]
  with_portfolio:   bool,
  #[arg(long)]
  with_note:        bool,
  #[arg(long)]
  with_resume:      bool,
  #[arg(long)]
  with_video:       bool,
}

impl ListArgs {
  fn into_query(self) -> ApplicationQuery {
    let flag = |on: bool| on.then_some(true);
    ApplicationQuery {
      search_value:           self.search,
      search_field:           self.search_field,
      limit:                  self.limit,
      offset:                 self.offset,
      sort_by:                self.sort_by,
      sort_direction:         self.direction,
      filter_status:          self.status,
      filter_category:        self.category,
      filter_min_skills:      flag(self.with_skills),
      filter_min_experiences: flag(self.with_experiences),
      filter_min_socials:     flag(self.with_socials),
      filter_has_portfolio:   flag(self.with_portfolio),
      filter_has_note:        flag(self.with_note),
      filter_has_resume:      flag(self.with_resume),
      filter_has_video:       flag(self.with_video),
    }
  }
}

/// Parse a CLI value through the type's JSON spelling.
fn parse_enum<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
  serde_json::from_value(serde_json::Value::String(raw.to_owned()))
    .map_err(|_| format!("unexpected value {raw:?}"))
}

pub async fn run(client: &ApiClient, command: AdminCommand) -> Result<()> {
  match command {
    AdminCommand::List(args) => {
      let query = args.into_query();
      query.validate()?;
      let page = client.list_applications(&query).await?;
      println!(
        "{} of {} applications (offset {})",
        page.applications.len(),
        page.total,
        page.offset
      );
      for app in &page.applications {
        println!("{}", summary(app));
      }
    }
    AdminCommand::Show { id } => {
      let detail = client
        .get_application(id)
        .await?
        .ok_or_else(|| anyhow!("no application with id {id}"))?;
      println!("{}", serde_json::to_string_pretty(&detail)?);
    }
    AdminCommand::Export { format, status, category, output } => {
      let filter = ExportFilter { filter_status: status, filter_category: category };
      let payload = client.export(format, &filter).await?;
      match output {
        Some(path) => {
          tokio::fs::write(&path, payload.data)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
          eprintln!("Wrote {}", path.display());
        }
        None => println!("{}", payload.data),
      }
    }
    AdminCommand::Public { id, off } => {
      let visibility = client.set_public(id, !off).await?;
      match visibility.shareable_url {
        Some(url) => println!("Public at {url}"),
        None => println!("Application {id} is private."),
      }
    }
    AdminCommand::Favorite { id } => {
      if client.toggle_favorite(id).await? {
        println!("Added {id} to favorites.");
      } else {
        println!("Removed {id} from favorites.");
      }
    }
    AdminCommand::Favorites { limit, offset } => {
      let page = client.list_favorites(limit, offset).await?;
      println!("{} of {} favorites", page.favorites.len(), page.total);
      for entry in &page.favorites {
        println!("{}  ★ {}", summary(&entry.application), entry.favorited_at.format("%Y-%m-%d"));
      }
    }
  }
  Ok(())
}

fn summary(app: &Application) -> String {
  format!(
    "{}  {}  {:<8}  {:<20}  {} <{}>",
    app.id,
    app.created_at.format("%Y-%m-%d"),
    app.status.as_ref(),
    app.category,
    app.full_name(),
    app.email
  )
}
