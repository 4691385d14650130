//! Route command: show which backend and model serve each task

use anyhow::Result;

use super::Context;

pub fn cmd_route(ctx: &Context, strategy: Option<&str>) -> Result<()> {
    let router = ctx.router(strategy)?;

    println!("Strategy: {}", router.strategy());
    println!();
    println!("{:<14} {:<10} {:<24} {:>8}", "TASK", "BACKEND", "MODEL", "TIMEOUT");
    println!("{}", "-".repeat(60));

    for (task, backend, model) in router.routes() {
        println!(
            "{:<14} {:<10} {:<24} {:>7}s",
            task.as_str(),
            backend.as_str(),
            model,
            router.timeout_for_task(task).as_secs()
        );
    }

    println!();
    match router.config_path() {
        Some(path) if path.exists() => println!("Config: {}", path.display()),
        Some(path) => println!("Config: built-in defaults (override at {})", path.display()),
        None => println!("Config: built-in defaults"),
    }
    Ok(())
}
