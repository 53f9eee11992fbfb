use color_eyre::{eyre::bail, Result};

pub fn init(verbosity: u8) -> Result<()> {
    simple_logger::init_with_level(level(verbosity)?)?;
    Ok(())
}

fn level(verbosity: u8) -> Result<log::Level> {
    Ok(match verbosity {
        0 => log::Level::Info,
        1 => log::Level::Debug,
        2 => log::Level::Trace,
        _ => bail!("At most two -v flags are supported"),
    })
}
