use std::path::Path;

use async_trait::async_trait;
use loco_rs::{
    app::{AppContext, Hooks},
    bgworker::Queue,
    boot::{create_app, BootResult, StartMode},
    config::Config,
    controller::AppRoutes,
    db::truncate_table,
    environment::Environment,
    task::Tasks,
    Result,
};
use migration::Migrator;

use crate::{
    controllers,
    models::_entities::{ai_screenings, candidates, feedback, interviewers, interviews, stage_changes, status_changes},
};

pub struct App;

#[async_trait]
impl Hooks for App {
    fn app_name() -> &'static str {
        env!("CARGO_CRATE_NAME")
    }

    fn app_version() -> String {
        format!(
            "{}-{}",
            env!("CARGO_PKG_VERSION"),
            option_env!("BUILD_SHA").or(option_env!("GITHUB_SHA")).unwrap_or("dev")
        )
    }

    async fn boot(mode: StartMode, environment: &Environment, config: Config) -> Result<BootResult> {
        create_app::<Self, Migrator>(mode, environment, config).await
    }

    fn routes(_ctx: &AppContext) -> AppRoutes {
        AppRoutes::with_default_routes()
            .prefix("/api")
            .add_route(controllers::candidates::routes())
            .add_route(controllers::interviewers::routes())
            .add_route(controllers::interviews::routes())
            .add_route(controllers::feedback::routes())
            .add_route(controllers::screenings::routes())
            .add_route(controllers::history::routes())
            .add_route(controllers::dashboard::routes())
            .layer(axum::middleware::from_fn(crate::errors::stamp_error_path))
    }

    async fn connect_workers(_ctx: &AppContext, _queue: &Queue) -> Result<()> {
        Ok(())
    }

    fn register_tasks(_tasks: &mut Tasks) {}

    async fn truncate(ctx: &AppContext) -> Result<()> {
        // Children before parents so foreign keys never reject the truncate.
        truncate_table(&ctx.db, feedback::Entity).await?;
        truncate_table(&ctx.db, status_changes::Entity).await?;
        truncate_table(&ctx.db, stage_changes::Entity).await?;
        truncate_table(&ctx.db, ai_screenings::Entity).await?;
        truncate_table(&ctx.db, interviews::Entity).await?;
        truncate_table(&ctx.db, candidates::Entity).await?;
        truncate_table(&ctx.db, interviewers::Entity).await?;
        Ok(())
    }

    async fn seed(_ctx: &AppContext, _base: &Path) -> Result<()> {
        Ok(())
    }
}
