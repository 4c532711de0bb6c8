//! Four-function calculator shown beside the question.
//!
//! Operators apply left to right as they are entered, like a pocket
//! calculator: `2 + 3 * 4 =` gives 20.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalcKey {
    Digit(u8),
    Point,
    Add,
    Subtract,
    Multiply,
    Divide,
    Equals,
    Backspace,
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Op {
    fn apply(self, lhs: f64, rhs: f64) -> Option<f64> {
        match self {
            Op::Add => Some(lhs + rhs),
            Op::Subtract => Some(lhs - rhs),
            Op::Multiply => Some(lhs * rhs),
            Op::Divide if rhs == 0.0 => None,
            Op::Divide => Some(lhs / rhs),
        }
    }

    fn symbol(self) -> char {
        match self {
            Op::Add => '+',
            Op::Subtract => '-',
            Op::Multiply => '×',
            Op::Divide => '÷',
        }
    }
}

const MAX_DIGITS: usize = 15;

#[derive(Debug, Clone, Default)]
pub struct Calculator {
    entry: String,
    accumulator: Option<f64>,
    pending: Option<Op>,
    error: bool,
}

impl Calculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: CalcKey) {
        if self.error && key != CalcKey::Clear {
            return;
        }
        match key {
            CalcKey::Digit(d) if d < 10 => {
                if self.entry.chars().filter(char::is_ascii_digit).count() < MAX_DIGITS {
                    if self.entry == "0" {
                        self.entry.clear();
                    }
                    self.entry.push(char::from(b'0' + d));
                }
            }
            CalcKey::Digit(_) => {}
            CalcKey::Point => {
                if !self.entry.contains('.') {
                    if self.entry.is_empty() {
                        self.entry.push('0');
                    }
                    self.entry.push('.');
                }
            }
            CalcKey::Add => self.operator(Op::Add),
            CalcKey::Subtract => self.operator(Op::Subtract),
            CalcKey::Multiply => self.operator(Op::Multiply),
            CalcKey::Divide => self.operator(Op::Divide),
            CalcKey::Equals => {
                self.collapse();
                self.pending = None;
            }
            CalcKey::Backspace => {
                self.entry.pop();
            }
            CalcKey::Clear => *self = Self::default(),
        }
    }

    fn operator(&mut self, op: Op) {
        if self.entry.is_empty() && self.accumulator.is_some() {
            // replace the operator just typed
            self.pending = Some(op);
            return;
        }
        self.collapse();
        if !self.error {
            self.pending = Some(op);
        }
    }

    /// Fold the current entry into the accumulator using the pending operator.
    fn collapse(&mut self) {
        let Some(value) = self.entry_value() else {
            return;
        };
        self.entry.clear();
        let next = match (self.accumulator, self.pending) {
            (Some(acc), Some(op)) => op.apply(acc, value),
            _ => Some(value),
        };
        match next {
            Some(v) => self.accumulator = Some(v),
            None => self.error = true,
        }
    }

    fn entry_value(&self) -> Option<f64> {
        if self.entry.is_empty() {
            None
        } else {
            self.entry.parse().ok()
        }
    }

    /// Current numeric value: the entry being typed, else the running total.
    pub fn value(&self) -> Option<f64> {
        self.entry_value().or(self.accumulator)
    }

    pub fn is_error(&self) -> bool {
        self.error
    }

    /// Text for the display line.
    pub fn display(&self) -> String {
        if self.error {
            return "Error".to_string();
        }
        let main = if self.entry.is_empty() {
            format_number(self.accumulator.unwrap_or(0.0))
        } else {
            self.entry.clone()
        };
        match (self.accumulator, self.pending) {
            (Some(acc), Some(op)) if !self.entry.is_empty() => {
                format!("{} {} {}", format_number(acc), op.symbol(), main)
            }
            (Some(acc), Some(op)) => format!("{} {}", format_number(acc), op.symbol()),
            _ => main,
        }
    }
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        let s = format!("{v:.10}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(keys: &[CalcKey]) -> Calculator {
        let mut calc = Calculator::new();
        for k in keys {
            calc.press(*k);
        }
        calc
    }

    fn digits(n: &str) -> Vec<CalcKey> {
        n.chars()
            .map(|c| match c {
                '.' => CalcKey::Point,
                d => CalcKey::Digit(d.to_digit(10).unwrap() as u8),
            })
            .collect()
    }

    #[test]
    fn evaluates_left_to_right() {
        let mut keys = digits("2");
        keys.push(CalcKey::Add);
        keys.extend(digits("3"));
        keys.push(CalcKey::Multiply);
        keys.extend(digits("4"));
        keys.push(CalcKey::Equals);

        let calc = run(&keys);
        assert_eq!(calc.value(), Some(20.0));
        assert_eq!(calc.display(), "20");
    }

    #[test]
    fn decimals_and_backspace() {
        let mut keys = digits("12.5");
        keys.push(CalcKey::Backspace);
        keys.extend(digits("25"));
        keys.push(CalcKey::Divide);
        keys.extend(digits("4"));
        keys.push(CalcKey::Equals);

        let calc = run(&keys);
        assert!((calc.value().unwrap() - 3.0625).abs() < 1e-9);
        assert_eq!(calc.display(), "3.0625");
    }

    #[test]
    fn second_point_is_ignored_and_leading_point_gets_zero() {
        let calc = run(&[CalcKey::Point, CalcKey::Digit(5), CalcKey::Point, CalcKey::Digit(1)]);
        assert_eq!(calc.display(), "0.51");
    }

    #[test]
    fn division_by_zero_latches_error_until_clear() {
        let mut keys = digits("8");
        keys.push(CalcKey::Divide);
        keys.extend(digits("0"));
        keys.push(CalcKey::Equals);
        let mut calc = run(&keys);

        assert!(calc.is_error());
        assert_eq!(calc.display(), "Error");
        calc.press(CalcKey::Digit(1));
        assert_eq!(calc.display(), "Error");

        calc.press(CalcKey::Clear);
        assert!(!calc.is_error());
        assert_eq!(calc.display(), "0");
    }

    #[test]
    fn operator_can_be_replaced() {
        let mut keys = digits("9");
        keys.push(CalcKey::Add);
        keys.push(CalcKey::Subtract);
        keys.extend(digits("4"));
        keys.push(CalcKey::Equals);
        assert_eq!(run(&keys).value(), Some(5.0));
    }

    #[test]
    fn display_shows_pending_expression() {
        let mut keys = digits("7");
        keys.push(CalcKey::Multiply);
        let calc = run(&keys);
        assert_eq!(calc.display(), "7 ×");

        let mut calc = calc;
        calc.press(CalcKey::Digit(3));
        assert_eq!(calc.display(), "7 × 3");
    }
}
