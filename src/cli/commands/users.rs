use clap::{Arg, ArgAction, Command};

pub const CMD_CREATE_USER: &str = "create-user";
pub const ARG_USERNAME: &str = "username";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_ADMIN: &str = "admin";

/// `create-user` writes one account to the Postgres user table.
#[must_use]
pub fn create_user() -> Command {
    Command::new(CMD_CREATE_USER)
        .about("Create a user in the database given by --dsn")
        .arg(
            Arg::new(ARG_USERNAME)
                .long("username")
                .help("Login name (letters, digits and @.+-_)")
                .required(true),
        )
        .arg(
            Arg::new(ARG_PASSWORD)
                .long("password")
                .help("Password for the new user")
                .env("AUTHGATE_CREATE_USER_PASSWORD")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_ADMIN)
                .long("admin")
                .help("Grant access to /admin/")
                .action(ArgAction::SetTrue),
        )
}
