mod config;

use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    account::PasswordForm,
    campaign::{CampaignEvent, CampaignPoller, PostulationDialog},
    reports::{EnrolledStudentsDialog, ProgressDialog},
    schedule::{self, ScheduleEditor, ScheduleRowInput},
    view::{Loadable, Notice, NoticeLevel},
    ActionOutcome, HttpClientOptions, HttpReservationClient, ReservationController,
    WorkflowAction, WorkflowEvent,
};
use shared::domain::{CampaignId, CourseGroupId, CourseId, LabId, ReservationId, DATE_FORMAT};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{info, warn};

use crate::config::{load_settings, ClientSettings, DEFAULT_CONFIG_FILE};

#[derive(Parser, Debug)]
#[command(about = "Command-line client for classroom reservations and lab campaigns")]
struct Cli {
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Overrides `server_url` from the config file and environment.
    #[arg(long)]
    server_url: Option<String>,
    /// Raw `Cookie` header of an authenticated session.
    #[arg(long)]
    cookie: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List classrooms free in a time window.
    Search {
        /// Defaults to today.
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },
    /// Search, pick a classroom by id or code, and request it.
    Reserve {
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long)]
        classroom: String,
        #[arg(long)]
        purpose: String,
    },
    List {
        #[arg(long)]
        json: bool,
    },
    Approve {
        reservation_id: String,
    },
    Reject {
        reservation_id: String,
        #[arg(long, default_value = "")]
        reason: String,
    },
    Cancel {
        reservation_id: String,
    },
    CheckConflicts {
        #[arg(long)]
        course: String,
        #[arg(long)]
        day: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long)]
        room: Option<String>,
    },
    /// Replace a course group's schedule. Rows are `DAY,ROOM,START,END`.
    SaveSchedule {
        #[arg(long)]
        group: String,
        #[arg(long = "row", required = true)]
        rows: Vec<String>,
    },
    /// Poll campaign status cards until interrupted.
    WatchCampaign {
        #[arg(long = "course", required = true)]
        courses: Vec<String>,
    },
    Postulate {
        #[arg(long)]
        campaign: String,
        #[arg(long)]
        lab: String,
    },
    /// Students enrolled in a lab, in enrollment order.
    EnrolledStudents {
        lab: String,
        /// Label for the header line.
        #[arg(long, default_value = "")]
        name: String,
    },
    /// Session timeline of a course group.
    Progress {
        group: String,
    },
    ChangePassword {
        #[arg(long)]
        old: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        confirm: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings(&cli.config)?;
    if let Some(server_url) = cli.server_url {
        settings.server_url = server_url;
    }
    if let Some(cookie) = cli.cookie {
        settings.session_cookie = Some(cookie);
    }

    let client = Arc::new(build_client(&settings)?);
    info!(server_url = %client.base_url(), "client ready");

    match cli.command {
        Command::Search { date, start, end } => {
            let controller = ReservationController::new(client.clone());
            let mut events = controller.subscribe_events();
            let result = controller
                .dispatch(WorkflowAction::Search {
                    date: date_or_today(date),
                    start_time: start,
                    end_time: end,
                })
                .await;
            print_notices(&mut events);
            result?;
            for (candidate, _) in controller.workflow().await.cards() {
                println!(
                    "{}\t{}\t{}\t{}\tcapacity={}",
                    candidate.id, candidate.code, candidate.name, candidate.location, candidate.capacity
                );
            }
        }
        Command::Reserve {
            date,
            start,
            end,
            classroom,
            purpose,
        } => {
            let controller = ReservationController::new(client.clone());
            let mut events = controller.subscribe_events();
            let result =
                reserve(&controller, date_or_today(date), start, end, &classroom, purpose).await;
            print_notices(&mut events);
            result?;
        }
        Command::List { json } => {
            let controller = ReservationController::new(client.clone());
            let reservations = controller.refresh().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&reservations)?);
            } else {
                for reservation in reservations {
                    println!(
                        "{}\t{}\t{} {}-{}\t{:?}\t{}",
                        reservation.reservation_id,
                        reservation.classroom_code,
                        reservation.date,
                        reservation.start_time,
                        reservation.end_time,
                        reservation.status,
                        reservation.purpose
                    );
                }
            }
        }
        Command::Approve { reservation_id } => {
            lifecycle(
                &client,
                WorkflowAction::Approve {
                    reservation_id: ReservationId::from(reservation_id),
                },
            )
            .await?;
        }
        Command::Reject {
            reservation_id,
            reason,
        } => {
            lifecycle(
                &client,
                WorkflowAction::Reject {
                    reservation_id: ReservationId::from(reservation_id),
                    reason,
                },
            )
            .await?;
        }
        Command::Cancel { reservation_id } => {
            lifecycle(
                &client,
                WorkflowAction::Cancel {
                    reservation_id: ReservationId::from(reservation_id),
                },
            )
            .await?;
        }
        Command::CheckConflicts {
            course,
            day,
            start,
            end,
            room,
        } => {
            let course_id = CourseId::from(course);
            let Some(request) =
                schedule::conflict_request(&course_id, &day, &start, &end, room.as_deref())?
            else {
                bail!("day, start and end are all required for a conflict check");
            };
            let outcome = schedule::check_conflicts(client.as_ref(), &request).await;
            print_notice(&outcome.notice());
        }
        Command::SaveSchedule { group, rows } => {
            let mut editor = ScheduleEditor::open(CourseGroupId::from(group), &[]);
            for (index, raw) in rows.iter().enumerate() {
                if index > 0 {
                    editor.add_row();
                }
                let row = editor
                    .row_mut(index)
                    .ok_or_else(|| anyhow!("row {} missing from editor", index + 1))?;
                *row = parse_row(raw)?;
            }
            let result = editor.save(client.as_ref()).await;
            if let Some(notice) = editor.notice() {
                print_notice(notice);
            }
            result?;
            println!("schedule saved ({} rows)", editor.rows().len());
        }
        Command::WatchCampaign { courses } => {
            watch_campaigns(client, &settings, courses).await?;
        }
        Command::Postulate { campaign, lab } => {
            let mut dialog = PostulationDialog::new();
            let lab_id = dialog.open(CampaignId::from(campaign), LabId::from(lab));
            dialog.load_details(client.as_ref(), &lab_id).await;
            let details = dialog.details();
            println!(
                "lab {lab_id}: {} {} room {}",
                details.day(),
                details.time(),
                details.room()
            );
            let result = dialog.confirm(client.as_ref()).await;
            if let Some(notice) = dialog.notice() {
                print_notice(notice);
            }
            result?;
        }
        Command::EnrolledStudents { lab, name } => {
            let mut dialog = EnrolledStudentsDialog::new();
            let label = if name.is_empty() { lab.clone() } else { name };
            dialog.open(LabId::from(lab), &label);
            dialog.load(client.as_ref()).await;
            println!("{}", dialog.title());
            if let Loadable::Ready(students) = dialog.content() {
                for student in students {
                    println!(
                        "{}	{}	{}	{}{}",
                        student.order,
                        student.full_name,
                        student.email,
                        student.timestamp,
                        if student.has_conflict { "	schedule conflict" } else { "" }
                    );
                }
            }
            if let Some(notice) = dialog.notice() {
                print_notice(&notice);
            }
            if let Loadable::Failed(notice) = dialog.content() {
                bail!("{}", notice.text);
            }
        }
        Command::Progress { group } => {
            let mut dialog = ProgressDialog::new();
            dialog.open(CourseGroupId::from(group));
            dialog.load(client.as_ref()).await;
            println!("{} / {}", dialog.title(), dialog.subtitle());
            if let Loadable::Ready(progress) = dialog.content() {
                for unit in &progress.syllabus_data {
                    println!("{}", unit.unit_name);
                    for session in &unit.sessions {
                        let mark = if session.is_completed { "x" } else { " " };
                        println!("  [{mark}] {:>2}. {}", session.number, session.topic);
                    }
                }
                println!(
                    "{}/{} sessions completed",
                    progress.completed_count(),
                    progress.session_count()
                );
            }
            if let Some(notice) = dialog.notice() {
                print_notice(&notice);
            }
            if let Loadable::Failed(notice) = dialog.content() {
                bail!("{}", notice.text);
            }
        }
        Command::ChangePassword { old, new, confirm } => {
            let mut form = PasswordForm::new();
            let result = form.submit(client.as_ref(), &old, &new, &confirm).await;
            for notice in form.notices() {
                print_notice(notice);
            }
            result?;
        }
    }

    Ok(())
}

fn build_client(settings: &ClientSettings) -> Result<HttpReservationClient> {
    let mut options = HttpClientOptions::new(settings.server_url.clone());
    options.cookie_header = settings.session_cookie.clone();
    options.csrf_cookie_name = settings.csrf_cookie_name.clone();
    options.timeout = settings.request_timeout();
    if options.cookie_header.is_none() {
        warn!("no session cookie configured; mutating requests will be refused");
    }
    HttpReservationClient::new(options).context("failed to create http client")
}

fn date_or_today(date: Option<String>) -> String {
    date.unwrap_or_else(|| chrono::Local::now().date_naive().format(DATE_FORMAT).to_string())
}

async fn reserve(
    controller: &ReservationController,
    date: String,
    start_time: String,
    end_time: String,
    classroom: &str,
    purpose: String,
) -> Result<()> {
    let outcome = controller
        .dispatch(WorkflowAction::Search {
            date,
            start_time,
            end_time,
        })
        .await?;
    if outcome == (ActionOutcome::Searched { candidates: 0 }) {
        bail!("no classrooms available");
    }

    let workflow = controller.workflow().await;
    let candidate = workflow
        .candidates()
        .iter()
        .find(|candidate| candidate.id.as_str() == classroom || candidate.code == classroom)
        .ok_or_else(|| anyhow!("classroom {classroom} is not available in that window"))?;

    controller
        .dispatch(WorkflowAction::Select {
            resource_id: candidate.id.clone(),
        })
        .await?;
    controller
        .dispatch(WorkflowAction::Submit { purpose })
        .await?;
    Ok(())
}

async fn lifecycle(client: &Arc<HttpReservationClient>, action: WorkflowAction) -> Result<()> {
    let controller = ReservationController::new(client.clone());
    let mut events = controller.subscribe_events();
    // Known statuses let disallowed transitions fail before any request.
    if let Err(err) = controller.refresh().await {
        warn!(error = %err, "could not load reservations; sending without a local status check");
    }
    let result = controller.dispatch(action).await;
    print_notices(&mut events);
    if let ActionOutcome::Updated {
        reservation_id,
        action,
    } = result?
    {
        println!("reservation {reservation_id}: {} done", action.name());
    }
    Ok(())
}

async fn watch_campaigns(
    client: Arc<HttpReservationClient>,
    settings: &ClientSettings,
    courses: Vec<String>,
) -> Result<()> {
    let poller = CampaignPoller::new(
        client,
        courses.into_iter().map(CourseId::from).collect(),
        settings.campaign_poll_period(),
    );
    let mut events = poller.subscribe();
    for status in poller.poll_once().await {
        print_campaign(&CampaignEvent::StatusUpdated(status));
    }
    let Some(handle) = poller.start() else {
        return Ok(());
    };

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => print_campaign(&event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "campaign events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("stopping campaign watch");
                break;
            }
        }
    }
    handle.stop();
    Ok(())
}

fn parse_row(raw: &str) -> Result<ScheduleRowInput> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    let [day, room, start, end] = parts.as_slice() else {
        bail!("schedule row must be DAY,ROOM,START,END: {raw}");
    };
    Ok(ScheduleRowInput::new(day, room, start, end))
}

fn print_notices(events: &mut broadcast::Receiver<WorkflowEvent>) {
    loop {
        match events.try_recv() {
            Ok(WorkflowEvent::Notice(notice)) => print_notice(&notice),
            Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
}

fn print_notice(notice: &Notice) {
    let label = match notice.level {
        NoticeLevel::Info => "info",
        NoticeLevel::Success => "ok",
        NoticeLevel::Warning => "warning",
        NoticeLevel::Error => "error",
    };
    println!("[{label}] {}", notice.text);
}

fn print_campaign(event: &CampaignEvent) {
    match event {
        CampaignEvent::StatusUpdated(status) => println!(
            "{}\t{:?}\t{}/{}{}",
            status.course_id,
            status.status,
            status.postulations,
            status.capacity,
            status
                .message
                .as_deref()
                .map(|message| format!("\t{message}"))
                .unwrap_or_default()
        ),
        CampaignEvent::PollFailed { course_id, message } => {
            println!("{course_id}\tunavailable\t{message}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_rows_need_four_fields() {
        let row = parse_row("LUNES, r-1, 08:00, 10:00").expect("valid row");
        assert_eq!(row, ScheduleRowInput::new("LUNES", "r-1", "08:00", "10:00"));
        assert!(parse_row("LUNES,r-1,08:00").is_err());
    }

    #[test]
    fn cli_parses_reject_with_reason() {
        let cli = Cli::try_parse_from([
            "console",
            "reject",
            "77",
            "--reason",
            "Room under maintenance",
        ])
        .expect("valid args");
        match cli.command {
            Command::Reject {
                reservation_id,
                reason,
            } => {
                assert_eq!(reservation_id, "77");
                assert_eq!(reason, "Room under maintenance");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_parses_enrolled_students_with_label() {
        let cli = Cli::try_parse_from(["console", "enrolled-students", "lab-4", "--name", "Lab 4"])
            .expect("valid args");
        match cli.command {
            Command::EnrolledStudents { lab, name } => {
                assert_eq!(lab, "lab-4");
                assert_eq!(name, "Lab 4");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
