use std::error::Error;

use clap::{Args, Parser, Subcommand, ValueEnum};
use engine::{AddressInput, DepotInput, Engine, EngineError, Role, UserRegistration};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

mod prompt;

#[derive(Parser, Debug)]
#[command(name = "rental_admin")]
#[command(about = "Admin utilities for the rental service (bootstrap accounts/depots)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./rental.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Depot(Depot),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Create an account; the password is prompted for.
    Create(UserCreateArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AccountRole {
    Renter,
    Staff,
    Admin,
}

impl From<AccountRole> for Role {
    fn from(role: AccountRole) -> Self {
        match role {
            AccountRole::Renter => Role::Renter,
            AccountRole::Staff => Role::Staff,
            AccountRole::Admin => Role::Admin,
        }
    }
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long, value_enum, default_value = "staff")]
    role: AccountRole,
    #[arg(long)]
    username: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,
    #[arg(long)]
    licence_id: Option<String>,
}

#[derive(Args, Debug)]
struct Depot {
    #[command(subcommand)]
    command: DepotCommand,
}

#[derive(Subcommand, Debug)]
enum DepotCommand {
    /// Create a depot on behalf of a staff account.
    Create(DepotCreateArgs),
}

#[derive(Args, Debug)]
struct DepotCreateArgs {
    /// Username or email of the staff account; its password is prompted for.
    #[arg(long = "as")]
    staff: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    zip: String,
    #[arg(long)]
    city: String,
    #[arg(long)]
    street: String,
    #[arg(long)]
    house_number: String,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Print every message of a rejected operation and exit.
fn fail(err: EngineError) -> ! {
    for message in err.messages() {
        eprintln!("{message}");
    }
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let password = prompt::new_password()?;
            let input = UserRegistration {
                name: args.name,
                username: args.username,
                email: args.email,
                password,
                phone_number: args.phone,
                licence_id: args.licence_id,
                address: None,
            };

            let user = engine
                .create_account(&input, args.role.into())
                .await
                .unwrap_or_else(|err| fail(err));
            println!(
                "created {} account: {} ({})",
                user.role.as_str(),
                input.username,
                user.id
            );
        }
        Command::Depot(Depot {
            command: DepotCommand::Create(args),
        }) => {
            let password = prompt::password("Password: ")?;
            let actor = engine
                .login(&args.staff, &password)
                .await
                .unwrap_or_else(|err| fail(err));

            let input = DepotInput {
                name: args.name,
                address: AddressInput {
                    zip: args.zip,
                    city: args.city,
                    street: args.street,
                    house_number: args.house_number,
                },
            };
            let depot = engine
                .create_depot(actor.id, &input)
                .await
                .unwrap_or_else(|err| fail(err));
            println!("created depot: {} ({})", input.name, depot.id);
        }
    }

    Ok(())
}
