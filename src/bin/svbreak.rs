// Copyright 2024 svbreak developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use anyhow::Result;
use log::LevelFilter;
use structopt::StructOpt;

use svbreak::cli::{run, SvBreak};

pub fn main() -> Result<()> {
    let opt = SvBreak::from_args();

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{}] {}", record.level(), message))
        })
        .level(if opt.verbose() {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .chain(std::io::stderr())
        .apply()?;

    run(opt)
}
