//! 交互式命令解释器：每一行命令对应一次文件系统操作

use std::fs::File;
use std::io::{self, Read, Write};
use std::ops::ControlFlow;
use std::path::Path;
use std::sync::Arc;

use block_dev::BlockDevice;
use log::debug;
use simple_fs::{FsError, Inumber, SimpleFileSystem};

/// copyin/copyout 每次搬运的字节数
const BUFFER_SIZE: usize = 16 * 1024;

const HELP: &str = "\
Commands are:
    format
    mount
    unmount
    debug
    create
    delete  <inode>
    getsize <inode>
    cat     <inode>
    copyin  <file> <inode>
    copyout <inode> <file>
    help
    quit
    exit";

pub struct Shell<W> {
    fs: SimpleFileSystem,
    out: W,
}

impl<W: Write> Shell<W> {
    pub fn new(block_device: Arc<dyn BlockDevice>, out: W) -> Self {
        Self {
            fs: SimpleFileSystem::new(block_device),
            out,
        }
    }

    #[inline]
    pub fn out_mut(&mut self) -> &mut W {
        &mut self.out
    }

    /// 执行一行命令。遇到 `quit`/`exit` 时返回 `Break`。
    pub fn execute(&mut self, line: &str) -> io::Result<ControlFlow<()>> {
        let args: Vec<&str> = line.split_whitespace().collect();
        let Some((&cmd, args)) = args.split_first() else {
            return Ok(ControlFlow::Continue(()));
        };
        debug!("command {cmd} {args:?}");

        match (cmd, args) {
            ("format", []) => match self.fs.format() {
                Ok(()) => writeln!(self.out, "disk formatted.")?,
                Err(e) => writeln!(self.out, "format failed: {e}")?,
            },
            ("mount", []) => match self.fs.mount() {
                Ok(()) => writeln!(self.out, "disk mounted.")?,
                Err(e) => writeln!(self.out, "mount failed: {e}")?,
            },
            ("unmount", []) => match self.fs.unmount() {
                Ok(()) => writeln!(self.out, "disk unmounted.")?,
                Err(e) => writeln!(self.out, "unmount failed: {e}")?,
            },
            ("debug", []) => match self.fs.dump() {
                Ok(report) => write!(self.out, "{report}")?,
                Err(e) => writeln!(self.out, "debug failed: {e}")?,
            },
            ("create", []) => match self.fs.create() {
                Ok(inumber) => writeln!(self.out, "created inode {inumber}")?,
                Err(e) => writeln!(self.out, "create failed: {e}")?,
            },
            ("delete", [inumber]) => {
                let Some(inumber) = self.parse_inumber(inumber)? else {
                    return Ok(ControlFlow::Continue(()));
                };
                match self.fs.delete(inumber) {
                    Ok(()) => writeln!(self.out, "inode {inumber} deleted.")?,
                    Err(e) => writeln!(self.out, "delete failed: {e}")?,
                }
            }
            ("getsize", [inumber]) => {
                let Some(inumber) = self.parse_inumber(inumber)? else {
                    return Ok(ControlFlow::Continue(()));
                };
                match self.fs.getsize(inumber) {
                    Ok(size) => writeln!(self.out, "inode {inumber} has size {size}")?,
                    Err(e) => writeln!(self.out, "getsize failed: {e}")?,
                }
            }
            ("cat", [inumber]) => {
                let Some(inumber) = self.parse_inumber(inumber)? else {
                    return Ok(ControlFlow::Continue(()));
                };
                if let Err(e) = copyout(&self.fs, inumber, &mut self.out) {
                    writeln!(self.out, "cat failed: {e}")?;
                }
            }
            ("copyin", [path, inumber]) => {
                let Some(inumber) = self.parse_inumber(inumber)? else {
                    return Ok(ControlFlow::Continue(()));
                };
                match copyin(&mut self.fs, Path::new(path), inumber) {
                    Ok(copied) => writeln!(self.out, "{copied} bytes copied")?,
                    Err(e) => writeln!(self.out, "copyin failed: {e}")?,
                }
            }
            ("copyout", [inumber, path]) => {
                let Some(inumber) = self.parse_inumber(inumber)? else {
                    return Ok(ControlFlow::Continue(()));
                };
                let copied = File::create(path)
                    .and_then(|mut file| copyout(&self.fs, inumber, &mut file));
                match copied {
                    Ok(copied) => writeln!(self.out, "{copied} bytes copied")?,
                    Err(e) => writeln!(self.out, "copyout failed: {e}")?,
                }
            }
            ("help", _) => writeln!(self.out, "{HELP}")?,
            ("quit" | "exit", _) => return Ok(ControlFlow::Break(())),
            (
                "format" | "mount" | "unmount" | "debug" | "create" | "delete" | "getsize"
                | "cat" | "copyin" | "copyout",
                _,
            ) => writeln!(self.out, "wrong arguments for {cmd}, see 'help'")?,
            _ => {
                writeln!(self.out, "unknown command: {}", line.trim())?;
                writeln!(self.out, "type 'help' for a list of commands.")?;
            }
        }

        Ok(ControlFlow::Continue(()))
    }

    fn parse_inumber(&mut self, arg: &str) -> io::Result<Option<Inumber>> {
        match arg.parse::<u32>() {
            Ok(raw) => Ok(Some(Inumber::new(raw))),
            Err(_) => {
                writeln!(self.out, "invalid inode number: {arg}")?;
                Ok(None)
            }
        }
    }
}

/// 把宿主机文件写入 inode，返回写入的字节数
fn copyin(fs: &mut SimpleFileSystem, path: &Path, inumber: Inumber) -> io::Result<usize> {
    let mut file = File::open(path)?;
    // 先清空 inode，空文件也能覆盖原有内容
    fs.write(inumber, &[], 0)
        .map_err(|e| io::Error::other(e.to_string()))?;

    let mut buffer = vec![0; BUFFER_SIZE];
    let mut offset = 0;
    loop {
        let len = file.read(&mut buffer)?;
        if len == 0 {
            break;
        }

        match fs.write(inumber, &buffer[..len], offset) {
            Ok(written) => offset += written,
            Err(FsError::DiskFull { written }) => {
                return Err(io::Error::other(format!(
                    "disk full after copying {} bytes",
                    offset + written
                )));
            }
            Err(e) => return Err(io::Error::other(e.to_string())),
        }
    }

    Ok(offset)
}

/// 把 inode 的全部内容写到 `dest`，返回读出的字节数
fn copyout(fs: &SimpleFileSystem, inumber: Inumber, dest: &mut impl Write) -> io::Result<usize> {
    let mut buffer = vec![0; BUFFER_SIZE];
    let mut offset = 0;

    loop {
        let len = fs
            .read(inumber, &mut buffer, offset)
            .map_err(|e| io::Error::other(e.to_string()))?;
        if len == 0 {
            break;
        }
        dest.write_all(&buffer[..len])?;
        offset += len;
    }

    Ok(offset)
}
