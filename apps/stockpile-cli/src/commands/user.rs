//! Account commands.

use serde_json::{json, Value};
use stockpile_core::{Action, Role, User};

use super::Context;
use crate::cli::UserCommand;
use crate::error::{CliError, CliResult};
use crate::output::to_json;

pub async fn run(ctx: &Context, command: UserCommand) -> CliResult<Value> {
    let users = ctx.db.users();

    match command {
        UserCommand::Add {
            username,
            new_password,
            role,
        } => {
            ctx.session.require(Action::ManageUsers)?;
            let role: Role = role.parse()?;
            to_json(&users.create(&username, &new_password, role).await?)
        }

        UserCommand::List => {
            ctx.session.require(Action::ManageUsers)?;
            to_json(&users.list_all().await?)
        }

        UserCommand::Remove { id } => {
            ctx.session.require(Action::ManageUsers)?;
            if id == ctx.session.user().id {
                return Err(CliError::invalid_argument(
                    "You cannot remove the account you are logged in with",
                ));
            }
            let target = find_user(ctx, id).await?;
            ensure_not_last_admin(ctx, &target).await?;

            users.remove_by_id(id).await?;
            Ok(json!({ "removed": id }))
        }

        UserCommand::SetRole { id, role } => {
            ctx.session.require(Action::ManageUsers)?;
            let role: Role = role.parse()?;
            let target = find_user(ctx, id).await?;
            if role != Role::Admin {
                ensure_not_last_admin(ctx, &target).await?;
            }

            users.set_role(id, role).await?;
            to_json(&User { role, ..target })
        }

        UserCommand::Whoami => to_json(ctx.session.user()),
    }
}

async fn find_user(ctx: &Context, id: i64) -> CliResult<User> {
    Ok(ctx.db.users().get_by_id(id).await?)
}

/// Refuses to take away the last admin account.
async fn ensure_not_last_admin(ctx: &Context, target: &User) -> CliResult<()> {
    if target.is_admin() && ctx.db.users().count_with_role(Role::Admin).await? <= 1 {
        return Err(CliError::invalid_argument(
            "At least one admin account must remain",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{as_user, context};
    use crate::error::ErrorCode;

    fn add(username: &str, role: &str) -> UserCommand {
        UserCommand::Add {
            username: username.into(),
            new_password: "password1".into(),
            role: role.into(),
        }
    }

    #[tokio::test]
    async fn test_add_and_list_users() {
        let ctx = context(Role::Admin).await;

        let created = run(&ctx, add("cashier", "user")).await.unwrap();
        assert_eq!(created["role"], "staff");

        let listed = run(&ctx, UserCommand::List).await.unwrap();
        let names: Vec<&str> = listed
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["username"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["operator", "cashier"]);
        assert!(listed[0].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_add_rejects_bad_input() {
        let ctx = context(Role::Admin).await;

        let err = run(&ctx, add("cashier", "owner")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArgument);

        let err = run(&ctx, add("operator", "staff")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = run(&ctx, add("x", "staff")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_last_admin_is_protected() {
        let ctx = context(Role::Admin).await;
        let me = ctx.session.user().id;

        let err = run(&ctx, UserCommand::Remove { id: me }).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArgument);

        let err = run(&ctx, UserCommand::SetRole { id: me, role: "staff".into() })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArgument);

        run(&ctx, add("second", "admin")).await.unwrap();
        let demoted = run(&ctx, UserCommand::SetRole { id: me, role: "staff".into() })
            .await
            .unwrap();
        assert_eq!(demoted["role"], "staff");
    }

    #[tokio::test]
    async fn test_remove_other_user() {
        let ctx = context(Role::Admin).await;
        let created = run(&ctx, add("cashier", "staff")).await.unwrap();
        let id = created["id"].as_i64().unwrap();

        run(&ctx, UserCommand::Remove { id }).await.unwrap();
        let err = run(&ctx, UserCommand::Remove { id }).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, format!("User not found: {}", id));

        let err = run(&ctx, UserCommand::SetRole { id, role: "admin".into() })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_staff_only_sees_themselves() {
        let admin = context(Role::Admin).await;
        let staff = admin
            .db
            .users()
            .create("cashier", "password1", Role::Staff)
            .await
            .unwrap();
        let ctx = as_user(admin, staff);

        let me = run(&ctx, UserCommand::Whoami).await.unwrap();
        assert_eq!(me["username"], "cashier");

        let err = run(&ctx, UserCommand::List).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }
}
