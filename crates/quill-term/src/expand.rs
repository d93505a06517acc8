#![forbid(unsafe_code)]

//! Parameterised capability string expansion.
//!
//! Capability strings embed a small stack language: parameters are
//! pushed with `%p1`..`%p9`, combined with arithmetic and comparisons,
//! and printed with printf-style conversions. Conditionals select
//! between palette ranges (the 256-color `setaf` template is the
//! heaviest user). This module interprets exactly the subset the
//! built-in entries use:
//!
//! | Code | Meaning |
//! |------|---------|
//! | `%%` | literal `%` |
//! | `%pN` | push parameter N (1-9) |
//! | `%{n}` | push integer constant |
//! | `%'c'` | push character constant |
//! | `%i` | increment parameters 1 and 2 (1-based cursor addressing) |
//! | `%d` `%x` `%X` | pop and print (optional `0`-flag and width, e.g. `%06x`) |
//! | `%c` | pop and emit as a byte |
//! | `%+ %- %* %/ %m` | arithmetic on the top two entries |
//! | `%< %> %=` | comparisons (push 1 or 0) |
//! | `%? %t %e %;` | if / then / else / endif, else-if chains included |
//! | `$<n>` | padding delay - skipped, no terminal needs it today |
//!
//! Stack underflow yields zeros rather than an error: parameters are
//! validated by construction upstream and a malformed string must not
//! take the UI down mid-flush.

use memchr::memchr2;
use smallvec::SmallVec;

/// Expand `template` with `params` (parameter 1 first), appending the
/// produced bytes to `out`.
pub fn expand_into(out: &mut Vec<u8>, template: &str, params: &[i64]) {
    let bytes = template.as_bytes();
    let mut p = [0i64; 9];
    for (slot, value) in p.iter_mut().zip(params.iter()) {
        *slot = *value;
    }

    let mut stack: SmallVec<[i64; 8]> = SmallVec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'$' if bytes.get(i + 1) == Some(&b'<') => {
                // Padding delay: skip "$<...>" entirely.
                i += 2;
                while i < bytes.len() && bytes[i] != b'>' {
                    i += 1;
                }
                i += 1;
            }
            b'%' => {
                i = step(bytes, i + 1, &mut p, &mut stack, out);
            }
            _ => {
                // Copy the literal run up to the next special byte.
                let end = memchr2(b'%', b'$', &bytes[i..])
                    .map_or(bytes.len(), |off| i + off);
                // A lone '$' not starting a delay is literal.
                let end = if end < bytes.len()
                    && bytes[end] == b'$'
                    && bytes.get(end + 1) != Some(&b'<')
                {
                    end + 1
                } else {
                    end
                };
                out.extend_from_slice(&bytes[i..end.max(i + 1).min(bytes.len())]);
                i = end.max(i + 1);
            }
        }
    }
}

fn pop(stack: &mut SmallVec<[i64; 8]>) -> i64 {
    stack.pop().unwrap_or(0)
}

/// Execute one `%` escape starting at `i` (past the `%`). Returns the
/// index after the escape.
fn step(
    bytes: &[u8],
    mut i: usize,
    params: &mut [i64; 9],
    stack: &mut SmallVec<[i64; 8]>,
    out: &mut Vec<u8>,
) -> usize {
    let Some(&code) = bytes.get(i) else {
        return i;
    };
    i += 1;

    match code {
        b'%' => out.push(b'%'),
        b'i' => {
            params[0] += 1;
            params[1] += 1;
        }
        b'p' => {
            if let Some(&n) = bytes.get(i) {
                i += 1;
                let idx = (n as char).to_digit(10).unwrap_or(1) as usize;
                stack.push(params[idx.clamp(1, 9) - 1]);
            }
        }
        b'{' => {
            let mut value: i64 = 0;
            let mut negative = false;
            if bytes.get(i) == Some(&b'-') {
                negative = true;
                i += 1;
            }
            while let Some(&d) = bytes.get(i) {
                i += 1;
                match d {
                    b'}' => break,
                    b'0'..=b'9' => {
                        value = value.wrapping_mul(10).wrapping_add(i64::from(d - b'0'));
                    }
                    _ => {}
                }
            }
            stack.push(if negative { -value } else { value });
        }
        b'\'' => {
            if let Some(&c) = bytes.get(i) {
                stack.push(i64::from(c));
                i += 1;
            }
            if bytes.get(i) == Some(&b'\'') {
                i += 1;
            }
        }
        b'd' => print_int(out, pop(stack), 10, false, 0),
        b'x' => print_int(out, pop(stack), 16, false, 0),
        b'X' => print_int(out, pop(stack), 16, true, 0),
        b'c' => out.push(pop(stack) as u8),
        b'+' | b'-' | b'*' | b'/' | b'm' => {
            let rhs = pop(stack);
            let lhs = pop(stack);
            stack.push(match code {
                b'+' => lhs.wrapping_add(rhs),
                b'-' => lhs.wrapping_sub(rhs),
                b'*' => lhs.wrapping_mul(rhs),
                b'/' => lhs.checked_div(rhs).unwrap_or(0),
                _ => lhs.checked_rem(rhs).unwrap_or(0),
            });
        }
        b'<' | b'>' | b'=' => {
            let rhs = pop(stack);
            let lhs = pop(stack);
            let holds = match code {
                b'<' => lhs < rhs,
                b'>' => lhs > rhs,
                _ => lhs == rhs,
            };
            stack.push(i64::from(holds));
        }
        b'?' | b';' => {}
        b't' => {
            if pop(stack) == 0 {
                i = skip_branch(bytes, i, true);
            }
        }
        b'e' => {
            // Reached after a taken then-branch: jump past the endif.
            i = skip_branch(bytes, i, false);
        }
        b'0'..=b'9' | b'.' | b':' | b'#' | b' ' => {
            // printf-style spec: flags and width, then the conversion.
            let mut zero_pad = false;
            let mut width: usize = 0;
            let mut c = code;
            loop {
                match c {
                    b'0' if width == 0 => zero_pad = true,
                    b'0'..=b'9' => width = width * 10 + (c - b'0') as usize,
                    b'.' | b':' | b'#' | b' ' | b'-' | b'+' => {}
                    b'd' => {
                        print_int(out, pop(stack), 10, false, if zero_pad { width } else { 0 });
                        break;
                    }
                    b'x' => {
                        print_int(out, pop(stack), 16, false, if zero_pad { width } else { 0 });
                        break;
                    }
                    b'X' => {
                        print_int(out, pop(stack), 16, true, if zero_pad { width } else { 0 });
                        break;
                    }
                    _ => break,
                }
                let Some(&next) = bytes.get(i) else {
                    break;
                };
                c = next;
                i += 1;
            }
        }
        _ => {
            // Unknown escape: emit verbatim so the damage is visible in
            // a capture rather than silently dropped.
            out.push(b'%');
            out.push(code);
        }
    }
    i
}

/// Skip a conditional branch. With `stop_at_else` the scan ends just
/// past a same-level `%e` (continuing an else/else-if chain) or past the
/// closing `%;`; otherwise only the `%;` terminates it.
fn skip_branch(bytes: &[u8], mut i: usize, stop_at_else: bool) -> usize {
    let mut level = 0usize;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }
        let Some(&code) = bytes.get(i + 1) else {
            return i + 1;
        };
        i += 2;
        match code {
            b'?' => level += 1,
            b';' => {
                if level == 0 {
                    return i;
                }
                level -= 1;
            }
            b'e' if level == 0 && stop_at_else => return i,
            b'{' => {
                while i < bytes.len() && bytes[i] != b'}' {
                    i += 1;
                }
            }
            b'\'' => {
                i += 2;
            }
            _ => {}
        }
    }
    i
}

fn print_int(out: &mut Vec<u8>, value: i64, radix: u32, upper: bool, zero_pad_width: usize) {
    let digits = match (radix, upper) {
        (16, false) => format!("{value:x}"),
        (16, true) => format!("{value:X}"),
        _ => format!("{value}"),
    };
    for _ in digits.len()..zero_pad_width {
        out.push(b'0');
    }
    out.extend_from_slice(digits.as_bytes());
}
