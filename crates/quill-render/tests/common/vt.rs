//! A reference cell-level terminal, test-only.
//!
//! Interprets exactly the sequences the renderer emits for an
//! xterm-family terminal (CUP, EL, ED, DECSTBM, LR margins, DL/IL, SGR
//! including 256-color and RGB forms, DEC private modes, OSC title) and
//! maintains the visible cell grid, so tests can check that the byte
//! stream reproduces the renderer's model exactly.
//!
//! Erase and delete/insert-line fill with the *current* SGR colors,
//! which is the back-color-erase behavior the renderer assumes when it
//! pre-sets the default colors before clearing sequences.

/// Style flag bits (test-local, independent of the crate under test).
pub const BOLD: u8 = 1;
pub const ITALIC: u8 = 2;
pub const UNDERLINE: u8 = 4;
pub const REVERSE: u8 = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VtCell {
    pub text: Vec<u8>,
    pub fg: i32,
    pub bg: i32,
    pub flags: u8,
}

impl VtCell {
    fn blank(fg: i32, bg: i32) -> Self {
        Self {
            text: b" ".to_vec(),
            fg,
            bg,
            flags: 0,
        }
    }
}

/// The reference terminal.
pub struct Vt {
    width: usize,
    height: usize,
    cells: Vec<VtCell>,
    row: usize,
    col: usize,
    fg: i32,
    bg: i32,
    flags: u8,
    top: usize,
    bot: usize,
    left: usize,
    right: usize,
    lr_enabled: bool,
    pub cursor_visible: bool,
    pub alt_screen: bool,
    pub mouse: bool,
    pub bracketed_paste: bool,
    pub focus_reporting: bool,
    pub bells: usize,
    pub title: String,
    pub cursor_style: Option<i32>,
}

enum State {
    Ground,
    Esc,
    Csi { params: Vec<u8>, private: bool, intermediate: Option<u8> },
    Osc { data: Vec<u8>, esc: bool },
    Dcs { esc: bool },
    Charset,
    Utf8 { pending: Vec<u8>, need: usize },
}

impl Vt {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![VtCell::blank(-1, -1); width * height],
            row: 0,
            col: 0,
            fg: -1,
            bg: -1,
            flags: 0,
            top: 0,
            bot: height - 1,
            left: 0,
            right: width - 1,
            lr_enabled: false,
            cursor_visible: true,
            alt_screen: false,
            mouse: false,
            bracketed_paste: false,
            focus_reporting: false,
            bells: 0,
            title: String::new(),
            cursor_style: None,
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> &VtCell {
        &self.cells[row * self.width + col]
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub fn row_text(&self, row: usize) -> String {
        (0..self.width)
            .map(|c| String::from_utf8_lossy(&self.cell(row, c).text).into_owned())
            .collect()
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        let mut state = State::Ground;
        for &b in bytes {
            state = self.step(state, b);
        }
    }

    fn step(&mut self, state: State, b: u8) -> State {
        match state {
            State::Ground => match b {
                0x1b => State::Esc,
                0x07 => {
                    self.bells += 1;
                    State::Ground
                }
                0x08 => {
                    self.col = self.col.saturating_sub(1);
                    State::Ground
                }
                b'\r' => {
                    self.col = 0;
                    State::Ground
                }
                b'\n' => {
                    self.row = (self.row + 1).min(self.height - 1);
                    State::Ground
                }
                0x00..=0x1f => State::Ground,
                0x20..=0x7e => {
                    self.print(&[b]);
                    State::Ground
                }
                _ => {
                    let need = utf8_len(b);
                    if need <= 1 {
                        State::Ground
                    } else {
                        State::Utf8 {
                            pending: vec![b],
                            need,
                        }
                    }
                }
            },
            State::Utf8 { mut pending, need } => {
                pending.push(b);
                if pending.len() == need {
                    let bytes = pending.clone();
                    self.print(&bytes);
                    State::Ground
                } else {
                    State::Utf8 { pending, need }
                }
            }
            State::Esc => match b {
                b'[' => State::Csi {
                    params: Vec::new(),
                    private: false,
                    intermediate: None,
                },
                b']' => State::Osc {
                    data: Vec::new(),
                    esc: false,
                },
                b'P' => State::Dcs { esc: false },
                b'(' | b')' => State::Charset,
                _ => State::Ground,
            },
            State::Charset => State::Ground,
            State::Csi {
                mut params,
                mut private,
                mut intermediate,
            } => match b {
                b'?' => {
                    private = true;
                    State::Csi {
                        params,
                        private,
                        intermediate,
                    }
                }
                b'0'..=b'9' | b';' => {
                    params.push(b);
                    State::Csi {
                        params,
                        private,
                        intermediate,
                    }
                }
                b' ' => {
                    intermediate = Some(b);
                    State::Csi {
                        params,
                        private,
                        intermediate,
                    }
                }
                0x40..=0x7e => {
                    self.csi(&params, private, intermediate, b);
                    State::Ground
                }
                _ => State::Csi {
                    params,
                    private,
                    intermediate,
                },
            },
            State::Osc { mut data, esc } => match (esc, b) {
                (_, 0x07) => {
                    self.osc(&data);
                    State::Ground
                }
                (true, b'\\') => {
                    self.osc(&data);
                    State::Ground
                }
                (_, 0x1b) => State::Osc { data, esc: true },
                _ => {
                    data.push(b);
                    State::Osc { data, esc: false }
                }
            },
            State::Dcs { esc } => match (esc, b) {
                (true, b'\\') => State::Ground,
                (_, 0x1b) => State::Dcs { esc: true },
                _ => State::Dcs { esc: false },
            },
        }
    }

    fn print(&mut self, bytes: &[u8]) {
        if self.row < self.height && self.col < self.width {
            let idx = self.row * self.width + self.col;
            self.cells[idx] = VtCell {
                text: bytes.to_vec(),
                fg: self.fg,
                bg: self.bg,
                flags: self.flags,
            };
        }
        self.col = (self.col + 1).min(self.width);
    }

    fn csi(&mut self, params: &[u8], private: bool, intermediate: Option<u8>, final_byte: u8) {
        let nums: Vec<i32> = String::from_utf8_lossy(params)
            .split(';')
            .map(|p| p.parse().unwrap_or(0))
            .collect();
        let arg = |i: usize, default: i32| -> i32 {
            nums.get(i).copied().filter(|&v| v != 0).unwrap_or(default)
        };

        if private {
            let on = final_byte == b'h';
            for part in String::from_utf8_lossy(params).split(';') {
                match part.parse::<i32>().unwrap_or(0) {
                    25 => self.cursor_visible = on,
                    1049 => self.alt_screen = on,
                    1002 | 1006 => self.mouse = on,
                    2004 => self.bracketed_paste = on,
                    1004 => self.focus_reporting = on,
                    69 => {
                        self.lr_enabled = on;
                        if !on {
                            self.left = 0;
                            self.right = self.width - 1;
                        }
                    }
                    _ => {}
                }
            }
            return;
        }

        if intermediate == Some(b' ') && final_byte == b'q' {
            self.cursor_style = Some(arg(0, 0));
            return;
        }

        match final_byte {
            b'H' | b'f' => {
                self.row = (arg(0, 1) as usize - 1).min(self.height - 1);
                self.col = (arg(1, 1) as usize - 1).min(self.width - 1);
            }
            b'K' => {
                let (fg, bg) = (self.fg, self.bg);
                let row = self.row;
                for col in self.col..self.width {
                    self.cells[row * self.width + col] = VtCell::blank(fg, bg);
                }
            }
            b'J' => {
                let mode = nums.first().copied().unwrap_or(0);
                let (fg, bg) = (self.fg, self.bg);
                let start = match mode {
                    2 => 0,
                    _ => self.row * self.width + self.col,
                };
                for cell in &mut self.cells[start..] {
                    *cell = VtCell::blank(fg, bg);
                }
            }
            b'r' => {
                self.top = (arg(0, 1) as usize - 1).min(self.height - 1);
                self.bot = (arg(1, self.height as i32) as usize - 1).min(self.height - 1);
                self.row = 0;
                self.col = 0;
            }
            b's' if nums.len() == 2 => {
                self.left = (arg(0, 1) as usize - 1).min(self.width - 1);
                self.right = (arg(1, self.width as i32) as usize - 1).min(self.width - 1);
                self.row = 0;
                self.col = 0;
            }
            b'M' => self.delete_lines(arg(0, 1) as usize),
            b'L' => self.insert_lines(arg(0, 1) as usize),
            b'm' => self.sgr(&nums, params.is_empty()),
            _ => {}
        }
    }

    fn margins(&self) -> (usize, usize) {
        if self.lr_enabled {
            (self.left, self.right)
        } else {
            (0, self.width - 1)
        }
    }

    fn delete_lines(&mut self, n: usize) {
        if self.row < self.top || self.row > self.bot {
            return;
        }
        let (left, right) = self.margins();
        let n = n.min(self.bot - self.row + 1);
        for dst in self.row..=self.bot {
            let src = dst + n;
            for col in left..=right {
                let value = if src <= self.bot {
                    self.cells[src * self.width + col].clone()
                } else {
                    VtCell::blank(self.fg, self.bg)
                };
                self.cells[dst * self.width + col] = value;
            }
        }
    }

    fn insert_lines(&mut self, n: usize) {
        if self.row < self.top || self.row > self.bot {
            return;
        }
        let (left, right) = self.margins();
        let n = n.min(self.bot - self.row + 1);
        for dst in (self.row..=self.bot).rev() {
            for col in left..=right {
                let value = if dst >= self.row + n {
                    self.cells[(dst - n) * self.width + col].clone()
                } else {
                    VtCell::blank(self.fg, self.bg)
                };
                self.cells[dst * self.width + col] = value;
            }
        }
    }

    fn sgr(&mut self, nums: &[i32], empty: bool) {
        if empty {
            self.reset_sgr();
            return;
        }
        let mut i = 0;
        while i < nums.len() {
            match nums[i] {
                0 => self.reset_sgr(),
                1 => self.flags |= BOLD,
                3 => self.flags |= ITALIC,
                4 => self.flags |= UNDERLINE,
                7 => self.flags |= REVERSE,
                22 => self.flags &= !BOLD,
                23 => self.flags &= !ITALIC,
                24 => self.flags &= !UNDERLINE,
                27 => self.flags &= !REVERSE,
                30..=37 => self.fg = nums[i] - 30,
                39 => self.fg = -1,
                40..=47 => self.bg = nums[i] - 40,
                49 => self.bg = -1,
                90..=97 => self.fg = nums[i] - 90 + 8,
                100..=107 => self.bg = nums[i] - 100 + 8,
                38 | 48 => {
                    let is_fg = nums[i] == 38;
                    let value = match nums.get(i + 1) {
                        Some(5) => {
                            let v = nums.get(i + 2).copied().unwrap_or(0);
                            i += 2;
                            v
                        }
                        Some(2) => {
                            let r = nums.get(i + 2).copied().unwrap_or(0);
                            let g = nums.get(i + 3).copied().unwrap_or(0);
                            let b = nums.get(i + 4).copied().unwrap_or(0);
                            i += 4;
                            (r << 16) | (g << 8) | b
                        }
                        _ => 0,
                    };
                    if is_fg {
                        self.fg = value;
                    } else {
                        self.bg = value;
                    }
                }
                _ => {}
            }
            i += 1;
        }
    }

    fn reset_sgr(&mut self) {
        self.fg = -1;
        self.bg = -1;
        self.flags = 0;
    }

    fn osc(&mut self, data: &[u8]) {
        let text = String::from_utf8_lossy(data);
        if let Some(title) = text.strip_prefix("0;").or_else(|| text.strip_prefix("2;")) {
            self.title = title.to_string();
        }
    }
}

fn utf8_len(b: u8) -> usize {
    match b {
        0x00..=0x7f => 1,
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf7 => 4,
        _ => 1,
    }
}
