// trustsync — Manifest Block Injector
//
// Maintains exactly one delimiter-bounded block of generated lines inside a
// file trustsync does not own. If the block exists it is replaced in place;
// otherwise it is appended at end-of-file. Every byte outside the block is
// preserved, and injecting the same block twice is a no-op.

use regex::Regex;

use super::ExportError;

/// Literal marker line opening the managed block.
pub const BLOCK_OPEN: &str = "## BEGIN TRUSTSYNC MANAGED BLOCK -- do not edit between these markers";
/// Literal marker line closing the managed block.
pub const BLOCK_CLOSE: &str = "## END TRUSTSYNC MANAGED BLOCK";

/// Return the new full content of the target file after injecting
/// `body_lines` as the managed block into `existing`.
pub fn inject_block(existing: &str, body_lines: &[String]) -> Result<String, ExportError> {
    let block = render_block(body_lines);

    // Both markers are escaped so user-supplied-looking delimiter text can
    // never act as regex metacharacters. The open marker must sit at
    // start-of-file or right after a line break; the body is matched
    // non-greedily up to the close marker.
    let pattern = format!(
        "(?m)^{open}\\r?\\n(?s:.*?){close}",
        open = regex::escape(BLOCK_OPEN),
        close = regex::escape(BLOCK_CLOSE),
    );
    let matcher = Regex::new(&pattern)?;

    if let Some(found) = matcher.find(existing) {
        let mut out = String::with_capacity(existing.len() + block.len());
        out.push_str(&existing[..found.start()]);
        out.push_str(&block);
        out.push_str(&existing[found.end()..]);
        Ok(out)
    } else {
        let mut out = String::with_capacity(existing.len() + block.len() + 2);
        out.push_str(existing);
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&block);
        out.push('\n');
        Ok(out)
    }
}

fn render_block(body_lines: &[String]) -> String {
    let mut block = String::new();
    block.push_str(BLOCK_OPEN);
    block.push('\n');
    for line in body_lines {
        block.push_str(line);
        block.push('\n');
    }
    block.push_str(BLOCK_CLOSE);
    block
}

// ─── Tests ───────────────────────────────────────────────────────────────────
