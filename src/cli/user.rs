use chrono::Utc;
use inquire::Text;
use serde::Serialize;
use uuid::Uuid;

use crate::store::Store;
use crate::types::User;

use super::init_store;
use super::pickers::validate_username;

#[derive(Serialize)]
struct UserOutput {
    id: String,
    username: String,
    groups: Vec<String>,
    created_at: String,
}

pub fn run_user_add(
    data_dir: String,
    username: Option<String>,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let (store, _) = init_store(&data_dir)?;

    let username = if let Some(name) = username {
        validate_username(&name).map_err(anyhow::Error::msg)?;
        name
    } else if non_interactive {
        anyhow::bail!("--username is required in non-interactive mode");
    } else {
        Text::new("Username:")
            .with_validator(|input: &str| {
                Ok(validate_username(input)
                    .map(|()| inquire::validator::Validation::Valid)
                    .unwrap_or_else(|e| inquire::validator::Validation::Invalid(e.into())))
            })
            .prompt()?
    };

    if store.get_user_by_username(&username)?.is_some() {
        anyhow::bail!("User '{}' already exists", username);
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        username: username.clone(),
        created_at: Utc::now(),
    };
    store.create_user(&user)?;

    println!("Created user \"{}\" ({})", username, user.id);

    Ok(())
}

pub fn run_user_list(data_dir: String, json: bool) -> anyhow::Result<()> {
    let (store, _) = init_store(&data_dir)?;
    let users = store.list_users("", 10000)?;

    let mut outputs = Vec::with_capacity(users.len());
    for user in users {
        let mut groups = Vec::new();
        for group_id in store.list_user_group_ids(&user.id)? {
            if let Some(group) = store.get_user_group(&group_id)? {
                groups.push(group.name);
            }
        }
        outputs.push(UserOutput {
            id: user.id,
            username: user.username,
            groups,
            created_at: user.created_at.to_rfc3339(),
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&outputs)?);
        return Ok(());
    }

    if outputs.is_empty() {
        println!("No users found.");
        return Ok(());
    }

    for user in &outputs {
        if user.groups.is_empty() {
            println!("{}  {}", user.username, user.id);
        } else {
            println!("{}  {}  [{}]", user.username, user.id, user.groups.join(", "));
        }
    }

    Ok(())
}
