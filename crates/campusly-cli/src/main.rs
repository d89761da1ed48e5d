use campusly_cli::seeder::{self, SeedConfig};
use campusly_core::hash_password;
use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use sqlx::PgPool;

#[derive(Parser)]
#[command(name = "campusly-cli")]
#[command(about = "Campusly CLI - Administrative tools for Campusly", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a school administrator account
    CreateAdmin {
        /// First name of the admin
        #[arg(short = 'f', long)]
        first_name: Option<String>,

        /// Last name of the admin
        #[arg(short = 'l', long)]
        last_name: Option<String>,

        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Seed the database with fake classes, teachers, students and parents
    Seed {
        /// Number of classes (Grade 1..N)
        #[arg(short = 'c', long, default_value = "6")]
        classes: usize,

        /// Number of sections per class
        #[arg(long, default_value = "2")]
        sections: usize,

        /// Number of students per section
        #[arg(long, default_value = "20")]
        students: usize,

        /// Number of teachers
        #[arg(long, default_value = "8")]
        teachers: usize,

        /// Academic year label, e.g. 2025/2026 (defaults to the current one)
        #[arg(long)]
        academic_year: Option<String>,
    },
    /// Clear all seeded data (keeps admins)
    ClearSeed,
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    let pool = match connect().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::CreateAdmin {
            first_name,
            last_name,
            email,
            password,
        } => handle_create_admin(&pool, first_name, last_name, email, password).await,
        Commands::Seed {
            classes,
            sections,
            students,
            teachers,
            academic_year,
        } => {
            let mut config = SeedConfig::new(classes)
                .with_sections_per_class(sections)
                .with_students_per_section(students)
                .with_teachers(teachers);
            if let Some(year) = academic_year {
                config = config.with_academic_year(year);
            }
            seeder::seed_all(&pool, &config).await.map(|_| ())
        }
        Commands::ClearSeed => seeder::clear_all(&pool).await.map(|_| ()),
    };

    if let Err(e) = result {
        eprintln!("\n❌ {:#}", e);
        std::process::exit(1);
    }
}

async fn connect() -> anyhow::Result<PgPool> {
    let pool = campusly_db::init_db_pool().await?;
    campusly_db::run_migrations(&pool).await?;
    Ok(pool)
}

async fn handle_create_admin(
    pool: &PgPool,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> anyhow::Result<()> {
    let first_name = match first_name {
        Some(v) => v,
        None => Input::new().with_prompt("First name").interact_text()?,
    };

    let last_name = match last_name {
        Some(v) => v,
        None => Input::new().with_prompt("Last name").interact_text()?,
    };

    let email: String = match email {
        Some(v) => v,
        None => Input::new().with_prompt("Email address").interact_text()?,
    };
    let email = email.trim().to_lowercase();

    let password = match password {
        Some(v) => v,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()?,
    };

    if !email.contains('@') {
        anyhow::bail!("'{}' is not a valid email address", email);
    }
    if password.len() < 8 {
        anyhow::bail!("Password must be at least 8 characters");
    }

    create_admin(pool, &first_name, &last_name, &email, &password).await?;

    println!("\n✅ Admin created successfully!");
    println!("   Email: {}", email);
    println!("   Name: {} {}", first_name, last_name);
    Ok(())
}

async fn create_admin(
    db: &PgPool,
    first_name: &str,
    last_name: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    let hashed_password = hash_password(password).map_err(|e| anyhow::anyhow!(e.message()))?;

    let user_id = sqlx::query_scalar::<_, uuid::Uuid>(
        "INSERT INTO users (first_name, last_name, email, password_hash, role, is_verified)
         VALUES ($1, $2, $3, $4, 'admin', TRUE)
         ON CONFLICT (email) DO NOTHING
         RETURNING id",
    )
    .bind(first_name)
    .bind(last_name)
    .bind(email)
    .bind(&hashed_password)
    .fetch_optional(db)
    .await?;

    if user_id.is_none() {
        anyhow::bail!("User with this email already exists");
    }

    Ok(())
}
