mod cli;

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use clap::Parser;
use cli::Cli;
use simple_fs_shell::{BlockFile, Shell};

fn main() -> io::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    println!("image={:?}\nblocks={}", cli.image, cli.blocks);

    let block_file = Arc::new(BlockFile::open(&cli.image, cli.blocks)?);
    let mut shell = Shell::new(block_file.clone(), io::stdout());

    let mut lines = io::stdin().lock().lines();
    loop {
        print!("sfs> ");
        io::stdout().flush()?;

        let Some(line) = lines.next().transpose()? else {
            println!();
            break;
        };
        if shell.execute(&line)?.is_break() {
            break;
        }
    }

    println!("closing emulated disk.");
    println!("{} disk block reads", block_file.reads());
    println!("{} disk block writes", block_file.writes());
    Ok(())
}
