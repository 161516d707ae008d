use std::io::Write;

use clap::Parser;
use tracing::info;

use super::{Command, CommandContext};
use crate::db::{NewUser, UserRepository};
use crate::{GatorError, Result};

/// Log in as an existing user
#[derive(Parser, Debug)]
pub struct Login {
    name: String,
}

impl Command for Login {
    async fn execute(self, ctx: &mut CommandContext) -> Result<()> {
        let user = UserRepository::new(ctx.db.pool())
            .get_by_name(&self.name)
            .await?
            .ok_or_else(|| GatorError::NotFound(format!("user {}", self.name)))?;

        ctx.session.set_user(&user.name)?;
        writeln!(ctx.out, "Logged in as {}", user.name)?;
        Ok(())
    }
}

/// Create a user and log in as them
#[derive(Parser, Debug)]
pub struct Register {
    name: String,
}

impl Command for Register {
    async fn execute(self, ctx: &mut CommandContext) -> Result<()> {
        let repo = UserRepository::new(ctx.db.pool());
        if repo.get_by_name(&self.name).await?.is_some() {
            return Err(GatorError::Validation(format!(
                "user {} already exists",
                self.name
            )));
        }

        let user = repo
            .create(&NewUser::new(self.name, ctx.clock.now()))
            .await?;
        info!("Registered user {} ({})", user.name, user.id);

        ctx.session.set_user(&user.name)?;
        writeln!(ctx.out, "User {} was created", user.name)?;
        Ok(())
    }
}

/// Delete all users, feeds, follows and posts
#[derive(Parser, Debug)]
pub struct Reset;

impl Command for Reset {
    async fn execute(self, ctx: &mut CommandContext) -> Result<()> {
        let removed = ctx.db.reset().await?;
        writeln!(ctx.out, "Reset complete, removed {} users", removed)?;
        Ok(())
    }
}

/// List registered users
#[derive(Parser, Debug)]
pub struct ListUsers;

impl Command for ListUsers {
    async fn execute(self, ctx: &mut CommandContext) -> Result<()> {
        let users = UserRepository::new(ctx.db.pool()).list_all().await?;
        let current = ctx.session.current_user_name();

        for user in users {
            if current == Some(user.name.as_str()) {
                writeln!(ctx.out, "* {} (current)", user.name)?;
            } else {
                writeln!(ctx.out, "* {}", user.name)?;
            }
        }
        Ok(())
    }
}
