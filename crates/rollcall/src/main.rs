//! `rollcall` - CLI for member registration
//!
//! Registers members with a photo and a traced signature, and lists, shows,
//! exports and deletes stored records.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::debug;

use rollcall::cli::{
    Cli, Command, ConfigCommand, DashboardCommand, DeleteCommand, ExportCommand, ListCommand,
    OutputFormat, RegisterCommand, ShowCommand,
};
use rollcall::member::{Member, MemberFilter};
use rollcall::photo::{Outcome, PhotoCapture, StillFrameCamera, UnavailableCamera};
use rollcall::signature::{ClientPoint, SignaturePad};
use rollcall::{init_logging, Config, Dashboard, Error, RegistrationForm, Storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Register(cmd) => handle_register(&config, &cmd).await,
        Command::List(cmd) => handle_list(&config, &cmd),
        Command::Show(cmd) => handle_show(&config, &cmd),
        Command::Delete(cmd) => handle_delete(&config, &cmd),
        Command::Export(cmd) => handle_export(&config, &cmd).await,
        Command::Dashboard(cmd) => handle_dashboard(&config, &cmd),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_storage(config: &Config) -> anyhow::Result<Storage> {
    let path = config.database_path();
    Storage::open(&path).with_context(|| format!("opening {}", path.display()))
}

async fn handle_register(config: &Config, cmd: &RegisterCommand) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let form = RegistrationForm::new(config.form.clone());
    form.edit(|member| cmd.apply_to(member));

    if let Some(path) = &cmd.photo {
        let photo = PhotoCapture::new(Arc::new(UnavailableCamera), config.photo.clone());
        photo.set_listener(form.photo_listener());
        let outcome = photo
            .select_file(path)
            .await
            .with_context(|| format!("reading photo {}", path.display()))?;
        ensure_applied(outcome, "photo selection")?;
    } else if let Some(path) = &cmd.camera_frame {
        let camera = StillFrameCamera::new(path);
        let photo = PhotoCapture::new(Arc::new(camera), config.photo.clone());
        photo.set_listener(form.photo_listener());
        let facing = cmd.facing.map_or(config.photo.default_facing, Into::into);
        ensure_applied(photo.open_camera(facing).await?, "camera open")?;
        photo.capture()?;
    }

    if let Some(path) = &cmd.signature {
        let strokes = read_strokes(path).await?;
        let mut pad = SignaturePad::from_config(&config.signature)?;
        pad.set_listener(form.signature_listener());
        for stroke in &strokes {
            pad.trace(stroke)?;
        }
        debug!("Traced {} signature strokes", pad.gesture_count());
    }

    let id = form.submit(&storage)?;
    println!("Registered member {id}");
    Ok(())
}

/// Nothing else drives the widget here, so a superseded result is a bug.
fn ensure_applied(outcome: Outcome, action: &str) -> anyhow::Result<()> {
    match outcome {
        Outcome::Applied => Ok(()),
        Outcome::Superseded => bail!("{action} was superseded before it completed"),
    }
}

async fn read_strokes(path: &Path) -> anyhow::Result<Vec<Vec<ClientPoint>>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading signature {}", path.display()))?;
    let strokes = serde_json::from_str(&text)
        .with_context(|| format!("parsing signature strokes in {}", path.display()))?;
    Ok(strokes)
}

fn handle_list(config: &Config, cmd: &ListCommand) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let filter = MemberFilter {
        search: cmd.search.clone(),
        group: cmd.group.map(Into::into),
    };
    let members = storage.list_filtered(&filter)?;

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&members)?),
        OutputFormat::Plain => {
            for member in &members {
                println!("{}\t{}", member.id.unwrap_or_default(), member.name);
            }
        }
        OutputFormat::Table => {
            println!(
                "{:>5}  {:<30}  {:<8}  {:<15}  {:<5}  {:<9}",
                "ID", "NAME", "GROUP", "CITY", "PHOTO", "SIGNATURE"
            );
            for member in &members {
                println!(
                    "{:>5}  {:<30}  {:<8}  {:<15}  {:<5}  {:<9}",
                    member.id.unwrap_or_default(),
                    truncate(&member.name, 30),
                    member.group.map_or("-", |g| g.as_str()),
                    truncate(&member.city, 15),
                    yes_no(member.has_photo()),
                    yes_no(member.has_signature()),
                );
            }
            println!("{} member(s)", members.len());
        }
    }
    Ok(())
}

fn handle_show(config: &Config, cmd: &ShowCommand) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let member = storage.get(cmd.id)?.ok_or(Error::NotFound { id: cmd.id })?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&member)?);
    } else {
        print_member(&member);
    }
    Ok(())
}

fn print_member(member: &Member) {
    let date = |d: Option<chrono::NaiveDate>| d.map_or_else(|| "-".to_string(), |d| d.to_string());
    let image = |i: Option<&rollcall::EncodedImage>| {
        i.map_or_else(
            || "none".to_string(),
            |i| format!("{} ({} bytes)", i.mime_type(), i.len()),
        )
    };

    println!("Member {}", member.id.unwrap_or_default());
    println!("=========");
    println!("  Serial number:   {}", member.serial_number);
    println!("  Name:            {}", member.name);
    println!("  Address:         {}", member.address);
    println!("  Neighborhood:    {}", member.neighborhood);
    println!("  City:            {}", member.city);
    println!("  Department:      {}", member.department);
    println!("  Cellphone:       {}", member.cellphone);
    println!("  Email:           {}", member.email);
    println!("  Birth date:      {}", date(member.birth_date));
    println!(
        "  Marital status:  {}",
        member.marital_status.map_or("-", |s| s.as_str())
    );
    println!("  Baptism date:    {}", date(member.baptism_date));
    println!("  Church:          {}", member.church);
    println!("  Time in church:  {}", member.time_in_church);
    println!("  Group:           {}", member.group.map_or("-", |g| g.as_str()));
    println!("  Updated:         {}", member.update_date);
    if let Some(created) = member.created_at {
        println!("  Registered:      {}", created.to_rfc3339());
    }
    println!("  Photo:           {}", image(member.photo.as_ref()));
    println!("  Signature:       {}", image(member.signature.as_ref()));
}

fn handle_delete(config: &Config, cmd: &DeleteCommand) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let member = storage.get(cmd.id)?.ok_or(Error::NotFound { id: cmd.id })?;

    if !cmd.yes {
        println!("This will delete member {} ({}).", cmd.id, member.name);
        println!("Use --yes to confirm.");
        return Ok(());
    }

    if storage.delete(cmd.id)? {
        println!("Deleted member {}", cmd.id);
    }
    Ok(())
}

async fn handle_export(config: &Config, cmd: &ExportCommand) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let member = storage.get(cmd.id)?.ok_or(Error::NotFound { id: cmd.id })?;

    let (what, image) = if cmd.photo {
        ("photo", member.photo)
    } else {
        ("signature", member.signature)
    };
    let Some(image) = image else {
        bail!("member {} has no {what}", cmd.id);
    };

    let summary = format!("{what} ({}, {} bytes)", image.mime_type(), image.len());
    tokio::fs::write(&cmd.out, image.into_bytes())
        .await
        .with_context(|| format!("writing {}", cmd.out.display()))?;
    println!("Wrote {summary} to {}", cmd.out.display());
    Ok(())
}

fn handle_dashboard(config: &Config, cmd: &DashboardCommand) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let dashboard = Dashboard::from_counts(storage.count()?, &storage.group_counts()?);

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
        return Ok(());
    }

    let stats = storage.stats()?;
    println!("Total registered: {}", dashboard.total);
    println!(
        "With photo: {}  With signature: {}",
        stats.with_photo, stats.with_signature
    );
    println!();
    for bar in &dashboard.groups {
        println!(
            "  {:<8} {:<40} {}",
            bar.group.as_str(),
            "#".repeat(bar_width(bar.percent, 40)),
            bar.count
        );
    }
    println!("  Scale: 0 - {}", dashboard.max_count);
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:   {}", config.database_path().display());
                println!();
                println!("[Signature]");
                println!(
                    "  Raster:          {}x{}",
                    config.signature.width, config.signature.height
                );
                println!("  Stroke color:    {}", config.signature.stroke_color);
                println!("  Stroke width:    {}", config.signature.stroke_width);
                println!();
                println!("[Photo]");
                println!(
                    "  Ideal size:      {}x{}",
                    config.photo.ideal_width, config.photo.ideal_height
                );
                println!("  JPEG quality:    {}", config.photo.jpeg_quality);
                println!("  Default facing:  {}", config.photo.default_facing);
                println!();
                println!("[Form]");
                println!("  Default church:  {}", config.form.default_church);
                println!("  Check email:     {}", config.form.require_email_format);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let kept: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn bar_width(percent: f64, width: usize) -> usize {
    let cells = (percent / 100.0 * width as f64).round().max(0.0) as usize;
    cells.min(width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_applied() {
        assert!(ensure_applied(Outcome::Applied, "camera open").is_ok());

        let err = ensure_applied(Outcome::Superseded, "photo selection").unwrap_err();
        assert!(err.to_string().contains("photo selection was superseded"));
    }

    #[test]
    fn test_bar_width() {
        assert_eq!(bar_width(100.0, 40), 40);
        assert_eq!(bar_width(25.0, 40), 10);
        assert_eq!(bar_width(0.0, 40), 0);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Ana", 30), "Ana");
        assert_eq!(truncate("Ana María Ruiz", 5), "Ana …");
    }
}
