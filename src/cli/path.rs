use serde::Serialize;

use crate::page::{from_trash_path, is_creatable_name, is_deletable_name, is_trash_path, to_trash_path};

#[derive(Serialize)]
struct PathReport<'a> {
    path: &'a str,
    creatable: bool,
    deletable: bool,
    trashed: bool,
    trash_path: String,
    live_path: String,
}

pub fn run_path_check(path: String, json: bool) -> anyhow::Result<()> {
    let report = PathReport {
        path: &path,
        creatable: is_creatable_name(&path),
        deletable: is_deletable_name(&path),
        trashed: is_trash_path(&path),
        trash_path: to_trash_path(&path),
        live_path: from_trash_path(&path),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let yes_no = |b: bool| if b { "yes" } else { "no" };
    println!("{}", report.path);
    println!("  creatable:  {}", yes_no(report.creatable));
    println!("  deletable:  {}", yes_no(report.deletable));
    if report.trashed {
        println!("  live path:  {}", report.live_path);
    } else {
        println!("  trash path: {}", report.trash_path);
    }

    Ok(())
}
