//! # priosim-core::csv_export
//!
//! Writes the results CSV, using the `csv` crate. The header, field order,
//! and textual conventions below are reproduced exactly from the source
//! simulator's `export_to_csv`, since the CSV is a consumer-facing
//! contract — an external analysis script parses it by column name.

use std::io::Write;
use std::path::Path;

use priosim_types::message::Message;

const HEADER: [&str; 12] = [
    "msg_id",
    "stream_id",
    "seq_num",
    "priority",
    "src_node",
    "dst_node",
    "size_bytes",
    "creation_time",
    "arrival_time",
    "end_to_end_delay_ms",
    "dropped",
    "drop_reason",
];

fn write_row<W: Write>(wtr: &mut csv::Writer<W>, msg: &Message) -> csv::Result<()> {
    let arrival_time = msg
        .arrival_time
        .map(|t| t.to_string())
        .unwrap_or_default();
    let delay_ms = msg
        .end_to_end_delay_ms()
        .map(|d| d.to_string())
        .unwrap_or_default();
    // Python's `csv.DictWriter` stringifies a `bool` as `True`/`False`;
    // reproduced literally here rather than Rust's lowercase `true`/`false`
    // since downstream consumers key off the exact text.
    let dropped = if msg.dropped { "True" } else { "False" };
    let drop_reason = msg.drop_reason.map(|r| r.as_str()).unwrap_or("");

    wtr.write_record([
        msg.msg_id.to_string(),
        msg.stream_id.to_string(),
        msg.seq_num.to_string(),
        msg.priority.to_string(),
        msg.src.as_str().to_string(),
        msg.dst.as_str().to_string(),
        msg.size_bytes.to_string(),
        msg.creation_time.to_string(),
        arrival_time,
        delay_ms,
        dropped.to_string(),
        drop_reason.to_string(),
    ])
}

/// Writes one row per message: `completed` first, then `dropped`, matching
/// the source's write order. Idempotent given identical inputs: no
/// timestamps or nondeterministic fields are emitted.
pub fn export_csv<'a, P: AsRef<Path>>(
    path: P,
    completed: impl Iterator<Item = &'a Message>,
    dropped: impl Iterator<Item = &'a Message>,
) -> Result<(), std::io::Error> {
    let file = std::fs::File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);
    wtr.write_record(HEADER)
        .map_err(csv_to_io_err)?;
    for msg in completed {
        write_row(&mut wtr, msg).map_err(csv_to_io_err)?;
    }
    for msg in dropped {
        write_row(&mut wtr, msg).map_err(csv_to_io_err)?;
    }
    wtr.flush()?;
    Ok(())
}

fn csv_to_io_err(e: csv::Error) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use priosim_types::message::DropReason;

    #[test]
    fn dropped_row_leaves_arrival_and_delay_empty() {
        let dir = std::env::temp_dir().join(format!("priosim_csv_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("out.csv");

        let mut dropped = Message::new(1, 1, 0, 5, "A".into(), "B".into(), 1000, 0.0);
        dropped.mark_dropped(DropReason::BufferOverflowTailDrop);

        let mut completed = Message::new(0, 1, 0, 5, "A".into(), "B".into(), 1000, 0.0);
        completed.arrival_time = Some(0.002);

        export_csv(&path, std::iter::once(&completed), std::iter::once(&dropped)).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "msg_id,stream_id,seq_num,priority,src_node,dst_node,size_bytes,creation_time,arrival_time,end_to_end_delay_ms,dropped,drop_reason"
        );
        let completed_row = lines.next().unwrap();
        assert!(completed_row.starts_with("0,1,0,5,A,B,1000,0,0.002,2,False,"));
        let dropped_row = lines.next().unwrap();
        assert!(dropped_row.ends_with(",,,True,Buffer overflow (tail drop)"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
