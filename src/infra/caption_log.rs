// ============================================================
// Layer 6 — Caption Log
// ============================================================
// `<run>_output.log`: one decoded caption per line, in video-id
// order. Rewritten (not appended) by every evaluation, so after a
// run it holds the test-set captions.

use anyhow::{Context, Result};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

pub fn write_caption_log<'a>(
    path:     &Path,
    captions: impl IntoIterator<Item = &'a str>,
) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Cannot create caption log '{}'", path.display()))?;
    let mut out = BufWriter::new(file);

    let mut lines = 0usize;
    for caption in captions {
        writeln!(out, "{caption}")?;
        lines += 1;
    }
    out.flush()
        .with_context(|| format!("Cannot write caption log '{}'", path.display()))?;

    tracing::debug!("Wrote {} captions to '{}'", lines, path.display());
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_caption_per_line_and_overwrites() {
        let path = std::env::temp_dir()
            .join(format!("scn_caption_log_{}.log", std::process::id()));

        write_caption_log(&path, ["a man is cooking", "", "two dogs play"]).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "a man is cooking\n\ntwo dogs play\n"
        );

        write_caption_log(&path, ["only line"]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "only line\n");

        std::fs::remove_file(&path).ok();
    }
}
