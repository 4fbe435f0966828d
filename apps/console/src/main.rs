use anyhow::Result;
use clap::{Parser, Subcommand};
use client_core::{MockSequenceApi, SequenceApi, SequenceClient};
use shared::{
    domain::{BorrowerId, DealerId, EnrollmentId, EnrollmentStatus},
    protocol::{CreateEnrollmentPayload, Enrollment, ReasonPayload, TimelineEvent},
};
use tracing::debug;

mod config;

#[derive(Parser, Debug)]
#[command(name = "collect", about = "Carpay Collect staff console")]
struct Args {
    /// Serve canned data instead of calling the backend.
    #[arg(long, global = true)]
    mock: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List enrollments in one status bucket.
    List {
        #[arg(long, default_value = "active")]
        status: EnrollmentStatus,
    },
    /// Show one enrollment together with its activity log.
    Show { id: String },
    /// Show only the activity log for one enrollment.
    Timeline { id: String },
    /// Enroll a borrower into the contact sequence.
    Create {
        #[arg(long)]
        borrower: String,
        #[arg(long)]
        dealer: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        vehicle: Option<String>,
        #[arg(long)]
        amount_due: Option<f64>,
    },
    /// Stop all automated contact for an enrollment.
    Suppress {
        id: String,
        #[arg(long)]
        reason: String,
    },
    /// Hand an enrollment off for manual follow-up.
    Escalate {
        id: String,
        #[arg(long)]
        reason: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();
    let settings = config::load_settings();
    debug!(api_base_url = %settings.api_base_url, "settings resolved");

    let api: Box<dyn SequenceApi> = if args.mock {
        Box::new(MockSequenceApi::seeded())
    } else {
        Box::new(SequenceClient::new(settings.api_base_url))
    };

    match args.command {
        Command::List { status } => {
            let enrollments = api.list_enrollments(status).await?;
            if enrollments.is_empty() {
                println!("no {} enrollments", status.as_str());
            }
            for enrollment in &enrollments {
                print_enrollment_line(enrollment);
            }
        }
        Command::Show { id } => {
            let id = EnrollmentId::new(id);
            // Fan-out is the caller's concern; the client itself issues one
            // request per call.
            let (enrollment, timeline) =
                tokio::join!(api.get_enrollment(&id), api.get_timeline(&id));
            print_enrollment(&enrollment?);
            println!("activity:");
            for event in &timeline? {
                print_event(event);
            }
        }
        Command::Timeline { id } => {
            let id = EnrollmentId::new(id);
            for event in &api.get_timeline(&id).await? {
                print_event(event);
            }
        }
        Command::Create {
            borrower,
            dealer,
            phone,
            email,
            vehicle,
            amount_due,
        } => {
            let created = api
                .create_enrollment(&CreateEnrollmentPayload {
                    borrower_id: BorrowerId::new(borrower),
                    dealer_id: DealerId::new(dealer),
                    phone,
                    email,
                    vehicle,
                    amount_due,
                })
                .await?;
            println!("created {}", created.id.0);
            print_enrollment(&created);
        }
        Command::Suppress { id, reason } => {
            let updated = api
                .suppress_enrollment(&EnrollmentId::new(id), &ReasonPayload::new(reason))
                .await?;
            println!("suppressed {}", updated.id.0);
            print_enrollment(&updated);
        }
        Command::Escalate { id, reason } => {
            let updated = api
                .escalate_enrollment(&EnrollmentId::new(id), &ReasonPayload::new(reason))
                .await?;
            println!("escalated {}", updated.id.0);
            print_enrollment(&updated);
        }
    }

    Ok(())
}

fn print_enrollment_line(enrollment: &Enrollment) {
    let amount = enrollment
        .amount_due
        .map(|due| format!("  due ${due:.2}"))
        .unwrap_or_default();
    println!(
        "{}  [{}]  day {}  borrower {}{}",
        enrollment.id.0,
        enrollment.status.as_str(),
        enrollment.current_day,
        enrollment.borrower_id.0,
        amount
    );
}

fn print_enrollment(enrollment: &Enrollment) {
    print_enrollment_line(enrollment);
    println!("  dealer: {}", enrollment.dealer_id.0);
    if let Some(phone) = &enrollment.phone {
        println!("  phone: {phone}");
    }
    if let Some(email) = &enrollment.email {
        println!("  email: {email}");
    }
    if let Some(vehicle) = &enrollment.vehicle {
        println!("  vehicle: {vehicle}");
    }
    if let Some(next) = enrollment.next_action_at {
        println!("  next action: {next}");
    }
    if let Some(posted) = enrollment.payment_posted_at {
        println!("  payment posted: {posted}");
    }
    if let Some(reason) = &enrollment.suppress_reason {
        println!("  suppress reason: {reason}");
    }
    if let Some(reason) = &enrollment.escalate_reason {
        println!("  escalate reason: {reason}");
    }
}

fn print_event(event: &TimelineEvent) {
    match event {
        TimelineEvent::TouchSent {
            channel,
            day,
            sent_at,
        } => println!("  {sent_at}  day {day}  touch sent via {}", channel.as_str()),
        TimelineEvent::CallCompleted {
            day,
            started_at,
            ended_at,
            outcome,
            transfer_reason,
            notes,
            intent_date,
        } => {
            let duration = (*ended_at - *started_at).num_seconds();
            println!(
                "  {started_at}  day {day}  call completed ({}, {duration}s)",
                outcome.as_str()
            );
            if let Some(reason) = transfer_reason {
                println!("      transferred: {reason}");
            }
            if let Some(notes) = notes {
                println!("      notes: {notes}");
            }
            if let Some(date) = intent_date {
                println!("      intends to pay by {date}");
            }
        }
        TimelineEvent::PaymentPosted { posted_at, amount } => {
            println!("  {posted_at}  payment posted ${amount:.2}")
        }
        TimelineEvent::Escalated {
            escalated_at,
            reason,
        } => println!("  {escalated_at}  escalated: {reason}"),
        TimelineEvent::Suppressed {
            suppressed_at,
            reason,
        } => println!("  {suppressed_at}  suppressed: {reason}"),
    }
}
