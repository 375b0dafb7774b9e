use super::OverlayOutput;
use super::types::{OverlayEvent, Role, Wrapper};

/// A wrapper currently written as open.
struct Active<'a> {
    wrapper: Wrapper<'a>,
    slot: usize,
    end: usize,
}

/// Walk `text` and a merged event stream in lockstep, writing text runs and
/// wrapper tokens to `output`.
///
/// Every close written matches the innermost open wrapper. A wrapper that
/// is still open above the one being closed gets closed with it and is
/// re-opened once every close at that position has been handled, and only
/// if its own range continues past it.
pub fn emit_overlay<'a, O: OverlayOutput>(
    text: &str,
    events: &[OverlayEvent<'a>],
    output: &mut O,
) -> Result<(), O::Error> {
    let mut open: Vec<Active<'a>> = Vec::new();
    // Interrupted at `cursor`, outermost first
    let mut interrupted: Vec<Active<'a>> = Vec::new();
    let mut cursor = 0;

    for event in events {
        let pos = event.pos.min(text.len());

        if pos > cursor || event.role == Role::Open {
            resume(&mut interrupted, &mut open, output)?;
        }
        if pos > cursor {
            if let Some(run) = text.get(cursor..pos) {
                output.write_text(run)?;
            }
            cursor = pos;
        }

        match event.role {
            Role::Open => {
                output.open(&event.wrapper)?;
                open.push(Active {
                    wrapper: event.wrapper,
                    slot: event.slot,
                    end: event.end,
                });
            }
            Role::Close => {
                // Missing when it ended here while interrupted by an earlier close
                let Some(depth) = open.iter().rposition(|a| a.slot == event.slot) else {
                    continue;
                };
                let mut closing = open.split_off(depth);
                for active in closing.iter().rev() {
                    output.close(&active.wrapper)?;
                }
                closing.remove(0);
                closing.retain(|active| active.end > pos);
                // Wrappers interrupted by this close sat below the earlier ones
                closing.append(&mut interrupted);
                interrupted = closing;
            }
        }
    }

    resume(&mut interrupted, &mut open, output)?;
    if let Some(rest) = text.get(cursor..).filter(|rest| !rest.is_empty()) {
        output.write_text(rest)?;
    }
    while let Some(active) = open.pop() {
        output.close(&active.wrapper)?;
    }

    Ok(())
}

fn resume<'a, O: OverlayOutput>(
    interrupted: &mut Vec<Active<'a>>,
    open: &mut Vec<Active<'a>>,
    output: &mut O,
) -> Result<(), O::Error> {
    for active in interrupted.drain(..) {
        output.open(&active.wrapper)?;
        open.push(active);
    }
    Ok(())
}
