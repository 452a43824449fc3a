use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use fake::{
    faker::{address::en::CityName, lorem::en::{Paragraph, Sentence}},
    Fake,
};
use rand::Rng;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use noticeboard::{
    domain::{Department, EventCategory, EventInput, NewUser, NoticeInput, Role, User},
    service::ServiceContext,
};

const DEPARTMENTS: [&str; 5] = [
    "Computer Science",
    "Mathematics",
    "Physics",
    "Literature",
    "Student Affairs",
];

#[derive(Parser)]
#[command(name = "seed", about = "Seed and administer the noticeboard database")]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://noticeboard.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Departments, demo accounts and sample notices/events
    Demo {
        #[arg(long, default_value_t = 25)]
        notices: usize,
        #[arg(long, default_value_t = 15)]
        events: usize,
    },
    /// Departments only
    Departments,
    /// Change a user's role (student, publisher or admin)
    SetRole {
        username: String,
        role: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&cli.database_url)
        .await?;

    println!("📋 Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    match cli.command {
        Command::Demo { notices, events } => seed_demo(db_pool, notices, events).await?,
        Command::Departments => {
            let ctx = ServiceContext::new(db_pool);
            let departments = seed_departments(&ctx).await?;
            println!("  ✅ {} departments available", departments.len());
        }
        Command::SetRole { username, role } => {
            let role = Role::parse(&role)
                .ok_or_else(|| anyhow::anyhow!("unknown role '{}', expected student, publisher or admin", role))?;
            let ctx = ServiceContext::new(db_pool);
            let user = ctx.user_service.set_role(&username, role).await?;
            println!("  ✅ {} is now {}", user.username, user.role);
        }
    }

    Ok(())
}

async fn seed_departments(ctx: &ServiceContext) -> anyhow::Result<Vec<Department>> {
    println!("🏫 Creating departments...");
    let existing = ctx.department_repo.list().await?;

    for name in DEPARTMENTS {
        if existing.iter().any(|d| d.name == name) {
            continue;
        }
        ctx.department_repo.create(name).await?;
        println!("  + {}", name);
    }

    Ok(ctx.department_repo.list().await?)
}

async fn ensure_user(ctx: &ServiceContext, username: &str, password: &str, role: Role) -> anyhow::Result<User> {
    let user = match ctx.user_repo.find_by_username(username).await? {
        Some(user) => user,
        None => ctx.user_service.register(NewUser {
            username: username.to_string(),
            email: format!("{}@college.local", username),
            password: password.to_string(),
        }).await?,
    };

    if user.role == role {
        return Ok(user);
    }
    Ok(ctx.user_service.set_role(username, role).await?)
}

async fn seed_demo(db_pool: SqlitePool, notice_count: usize, event_count: usize) -> anyhow::Result<()> {
    let ctx = ServiceContext::new(db_pool);
    let departments = seed_departments(&ctx).await?;

    println!("👥 Creating accounts...");
    let admin = ensure_user(&ctx, "admin", "admin123", Role::Admin).await?;
    let publisher = ensure_user(&ctx, "publisher", "publisher123", Role::Publisher).await?;
    ensure_user(&ctx, "student", "student123", Role::Student).await?;
    println!("  ✅ admin / admin123, publisher / publisher123, student / student123");

    let authors = [&admin, &publisher];
    let mut rng = rand::thread_rng();
    let now = Utc::now();

    println!("📢 Creating {} notices...", notice_count);
    for i in 0..notice_count {
        let author = authors[i % authors.len()];
        let department_id = pick_department(&mut rng, &departments);
        let input = NoticeInput {
            title: Sentence(3..7).fake(),
            content: Paragraph(2..5).fake(),
            department_id,
        };
        let issue_date = now - Duration::hours(rng.gen_range(1..24 * 60));
        ctx.notice_repo.create(author.id, &input, issue_date).await?;
    }

    println!("📅 Creating {} events...", event_count);
    for i in 0..event_count {
        let author = authors[i % authors.len()];
        let category = if rng.gen_bool(0.8) {
            Some(EventCategory::ALL[rng.gen_range(0..EventCategory::ALL.len())])
        } else {
            None
        };
        let venue: String = CityName().fake();
        let input = EventInput {
            title: Sentence(2..6).fake(),
            description: Paragraph(1..4).fake(),
            event_date: now + Duration::hours(rng.gen_range(2..24 * 90)),
            venue: format!("{} Hall", venue),
            category,
            department_id: pick_department(&mut rng, &departments),
        };
        ctx.event_repo.create(author.id, &input).await?;
    }

    println!("🎉 Seeding complete");
    Ok(())
}

fn pick_department(rng: &mut impl Rng, departments: &[Department]) -> Option<i64> {
    if departments.is_empty() || rng.gen_bool(0.2) {
        return None;
    }
    Some(departments[rng.gen_range(0..departments.len())].id)
}
