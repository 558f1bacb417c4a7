use crate::connections::AdbProtocolRespDataType;
use log::trace;
use std::io::{self, Write};

/// 单个 `DATA` 帧允许的最大负载
pub const SYNC_DATA_MAX: usize = 64 * 1024;

/// 把输入切成不超过 64 KiB 的 `DATA` 帧, 并把同一帧广播给所有目标。
///
/// 缓冲区写满时立即发出一帧; `finish` 发出剩余部分 (为空时不发)。
/// `flush` 只刷新目标, 不会提前切帧。缓冲区只由驱动 push 的单个线程修改。
pub struct SectionedMultiWriter<W: Write> {
    writers: Vec<W>,
    buffer: Vec<u8>,
    sections: usize,
}

impl<W: Write> SectionedMultiWriter<W> {
    pub fn new(writers: Vec<W>) -> Self {
        SectionedMultiWriter {
            writers,
            buffer: Vec::with_capacity(SYNC_DATA_MAX),
            sections: 0,
        }
    }

    /// 已经发出的帧数
    pub fn sections(&self) -> usize {
        self.sections
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn emit_section(&mut self) -> io::Result<()> {
        let mut header = [0u8; 8];
        header[..4].copy_from_slice(AdbProtocolRespDataType::DATA.code());
        header[4..].copy_from_slice(&(self.buffer.len() as u32).to_le_bytes());
        for writer in self.writers.iter_mut() {
            writer.write_all(&header)?;
            writer.write_all(&self.buffer)?;
        }
        self.sections += 1;
        trace!(
            "Emit DATA section #{} ({} bytes)",
            self.sections,
            self.buffer.len()
        );
        self.buffer.clear();
        Ok(())
    }

    /// 发出剩余数据并交还目标
    pub fn finish(mut self) -> io::Result<Vec<W>> {
        if !self.buffer.is_empty() {
            self.emit_section()?;
        }
        for writer in self.writers.iter_mut() {
            writer.flush()?;
        }
        Ok(self.writers)
    }
}

impl<W: Write> Write for SectionedMultiWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut rest = buf;
        while !rest.is_empty() {
            let room = SYNC_DATA_MAX - self.buffer.len();
            let (head, tail) = rest.split_at(room.min(rest.len()));
            self.buffer.extend_from_slice(head);
            rest = tail;
            if self.buffer.len() == SYNC_DATA_MAX {
                self.emit_section()?;
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        for writer in self.writers.iter_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}
