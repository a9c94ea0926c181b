// CLI command implementations
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read};

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;

use oggframe::ogg::GRANULE_UNSET;
use oggframe::{OggConfig, OggError, OggFile, Page};

use crate::cli::config::{Commands, Config};
use crate::cli::output::OutputFormatter;

/// Per logical stream page statistics
#[derive(Debug, Default, Serialize)]
pub struct StreamSummary {
    pub sid: String,
    pub pages: usize,
    pub packets: usize,
    pub bytes: usize,
    pub bos: bool,
    pub eos: bool,
    pub last_granule: Option<u64>,
    pub bad_checksums: usize,
    pub sequence_gaps: usize,
}

#[derive(Debug, Serialize)]
pub struct FileSummary {
    pub path: String,
    pub pages: usize,
    pub bytes: usize,
    pub streams: Vec<StreamSummary>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PacketRow {
    pub sid: String,
    pub page: u32,
    pub granule: u64,
    pub size: usize,
    pub bos: bool,
    pub eos: bool,
}

#[derive(Debug, Serialize)]
pub struct VerifyReport {
    pub path: String,
    pub packets: usize,
    pub streams: usize,
    pub problems: Vec<String>,
    pub ok: bool,
}

/// Run the selected command, returning the process exit code
pub fn run(config: &Config) -> Result<i32> {
    let formatter = OutputFormatter::new(config.format, config.quiet);
    let ogg_config = config.ogg_config();

    match &config.command {
        Commands::Info { files } => command_info(files, &formatter),
        Commands::Packets { file, limit } => command_packets(file, *limit, ogg_config, &formatter),
        Commands::Verify { files } => command_verify(files, ogg_config, &formatter),
        Commands::Copy { source, target, .. } => command_copy(source, target, ogg_config),
    }
}

fn open(path: &str) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path))?;
    Ok(BufReader::new(file))
}

/// Summarize pages of file(s)
fn command_info(files: &[String], formatter: &OutputFormatter) -> Result<i32> {
    let mut reports = Vec::new();
    let mut code = 0;

    for path in files {
        match open(path) {
            Ok(mut reader) => {
                let summary = summarize_pages(path, &mut reader);
                if summary.error.is_some() {
                    code = 1;
                }
                reports.push(summary);
            }
            Err(e) => {
                formatter.print_error(&format!("{:#}", e));
                code = 1;
            }
        }
    }

    formatter.output(&reports, &mut io::stdout().lock())?;
    Ok(code)
}

/// Walk the raw pages of a stream
pub fn summarize_pages<R: Read>(path: &str, reader: &mut R) -> FileSummary {
    let mut streams: BTreeMap<u32, StreamSummary> = BTreeMap::new();
    let mut last_sequence: HashMap<u32, u32> = HashMap::new();
    let mut pages = 0;
    let mut bytes = 0;
    let mut error = None;

    loop {
        let (page, checksum_ok) = match Page::read(reader) {
            Ok(Some(page)) => (page, true),
            Ok(None) => break,
            Err(OggError::BadChecksum { page, .. }) => (*page, false),
            Err(e) => {
                error = Some(e.to_string());
                break;
            }
        };

        pages += 1;
        bytes += page.encoded_len();

        let sid = page.serial();
        let stream = streams.entry(sid).or_insert_with(|| StreamSummary {
            sid: format!("{:#010x}", sid),
            ..Default::default()
        });
        stream.pages += 1;
        stream.packets += page.packet_count();
        stream.bytes += page.data().len();
        stream.bos |= page.is_bos();
        stream.eos |= page.is_eos();
        if page.granule_position() != GRANULE_UNSET {
            stream.last_granule = Some(page.granule_position());
        }
        if !checksum_ok {
            stream.bad_checksums += 1;
        }
        if let Some(last) = last_sequence.insert(sid, page.sequence()) {
            if page.sequence() != last.wrapping_add(1) {
                stream.sequence_gaps += 1;
            }
        }
    }

    FileSummary {
        path: path.to_string(),
        pages,
        bytes,
        streams: streams.into_values().collect(),
        error,
    }
}

/// List packets of one file
fn command_packets(
    path: &str,
    limit: Option<usize>,
    ogg_config: OggConfig,
    formatter: &OutputFormatter,
) -> Result<i32> {
    let mut ogg = OggFile::with_config(open(path)?, ogg_config);
    let mut reader = ogg.packet_reader()?;
    let mut rows = Vec::new();
    let mut code = 0;

    while limit.map_or(true, |n| rows.len() < n) {
        match reader.next_packet() {
            Ok(Some(p)) => rows.push(PacketRow {
                sid: format!("{:#010x}", p.sid()),
                page: p.sequence_number(),
                granule: p.granule_position(),
                size: p.len(),
                bos: p.is_bos(),
                eos: p.is_eos(),
            }),
            Ok(None) => break,
            Err(e) if e.is_recoverable() => {
                formatter.print_error(&format!("{}: {}", path, e));
                code = 1;
            }
            Err(e) => return Err(e).with_context(|| format!("reading {}", path)),
        }
    }

    formatter.output(&rows, &mut io::stdout().lock())?;
    Ok(code)
}

/// Read every packet of file(s) and collect reported corruption
fn command_verify(files: &[String], ogg_config: OggConfig, formatter: &OutputFormatter) -> Result<i32> {
    let mut reports = Vec::new();
    for path in files {
        match open(path) {
            Ok(reader) => reports.push(verify_stream(path, reader, ogg_config)),
            Err(e) => {
                formatter.print_error(&format!("{:#}", e));
                reports.push(VerifyReport {
                    path: path.clone(),
                    packets: 0,
                    streams: 0,
                    problems: vec![format!("{:#}", e)],
                    ok: false,
                });
            }
        }
    }

    let code = if reports.iter().all(|r| r.ok) { 0 } else { 1 };
    formatter.output(&reports, &mut io::stdout().lock())?;
    Ok(code)
}

pub fn verify_stream<R: Read>(path: &str, input: R, ogg_config: OggConfig) -> VerifyReport {
    let mut ogg = OggFile::with_config(input, ogg_config);
    let mut packets = 0;
    let mut sids = Vec::new();
    let mut problems = Vec::new();

    match ogg.packet_reader() {
        Ok(mut reader) => loop {
            match reader.next_packet() {
                Ok(Some(p)) => {
                    packets += 1;
                    if !sids.contains(&p.sid()) {
                        sids.push(p.sid());
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("{}: {}", path, e);
                    problems.push(e.to_string());
                }
            }
        },
        Err(e) => problems.push(e.to_string()),
    }

    VerifyReport {
        path: path.to_string(),
        packets,
        streams: sids.len(),
        ok: problems.is_empty(),
        problems,
    }
}

/// Re-frame all logical streams of source into target
fn command_copy(source: &str, target: &str, ogg_config: OggConfig) -> Result<i32> {
    let mut input = OggFile::with_config(open(source)?, ogg_config);
    let output = File::create(target).with_context(|| format!("cannot create {}", target))?;
    let mut output = OggFile::with_config(BufWriter::new(output), ogg_config);

    let packets = copy_packets(&mut input, &mut output).with_context(|| format!("copying {}", source))?;
    output.close().with_context(|| format!("finishing {}", target))?;

    info!("copied {} packets from {} to {}", packets, source, target);
    Ok(0)
}

/// Copy every packet, starting a new page wherever the source did
pub fn copy_packets<R: Read, W: io::Write>(
    input: &mut OggFile<R>,
    output: &mut OggFile<W>,
) -> oggframe::Result<usize> {
    // (sid, page sequence) of the previous packet, across all streams
    let mut last_page: Option<(u32, u32)> = None;
    let mut count = 0;
    let mut reader = input.packet_reader()?;

    while let Some(packet) = reader.next_packet()? {
        let page = (packet.sid(), packet.sequence_number());
        if let Some((sid, sequence)) = last_page.replace(page) {
            if (sid, sequence) != page {
                // the previous page is complete; emit it before anything later
                let mut previous = output.packet_writer(sid)?;
                if !previous.is_closed() {
                    previous.flush()?;
                }
            }
        }

        let mut writer = output.packet_writer(page.0)?;
        let eos = packet.is_eos();
        writer.buffer_packet(packet)?;
        if eos {
            writer.close()?;
        }
        count += 1;
    }
    Ok(count)
}
