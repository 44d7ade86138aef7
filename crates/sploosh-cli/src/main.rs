mod command;
mod schema;
mod util;
mod view;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "warn"),
    )
    .format_timestamp(None)
    .init();
    command::run()
}
