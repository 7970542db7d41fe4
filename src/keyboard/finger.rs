use crate::keyboard::model::Shape;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hand {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Finger {
    Pinky,
    Ring,
    Middle,
    Index,
    Thumb,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FingerAssignment {
    pub hand: Hand,
    pub finger: Finger,
}

impl FingerAssignment {
    pub fn new(hand: Hand, finger: Finger) -> Self {
        Self { hand, finger }
    }

    pub fn describe(&self) -> String {
        let hand = match self.hand {
            Hand::Left => "left",
            Hand::Right => "right",
        };
        let finger = match self.finger {
            Finger::Pinky => "pinky",
            Finger::Ring => "ring",
            Finger::Middle => "middle",
            Finger::Index => "index",
            Finger::Thumb => "thumb",
        };
        format!("{hand} {finger}")
    }
}

/// Finger assignment for an XKB position name (`AE01`, `AC05`, `LFSH`, ...).
///
/// The digit row is the only row whose fingering depends on the shape: on
/// ISO (pc105) boards the left hand reaches one key further.
pub fn finger_for(position: &str, shape: Shape) -> FingerAssignment {
    use Finger::*;
    use Hand::*;

    match position {
        "SPCE" => return FingerAssignment::new(Right, Thumb),
        "TLDE" | "LSGT" | "TAB" | "CAPS" | "LFSH" => return FingerAssignment::new(Left, Pinky),
        "BKSP" | "BKSL" | "RTRN" | "RTSH" => return FingerAssignment::new(Right, Pinky),
        _ => {}
    }

    let Some((row, col)) = split_position(position) else {
        return FingerAssignment::new(Right, Index);
    };

    if row == "AE" && shape == Shape::Pc105 {
        return match col {
            1 | 2 => FingerAssignment::new(Left, Pinky),
            3 => FingerAssignment::new(Left, Ring),
            4 => FingerAssignment::new(Left, Middle),
            5 | 6 => FingerAssignment::new(Left, Index),
            7 | 8 => FingerAssignment::new(Right, Index),
            9 => FingerAssignment::new(Right, Middle),
            10 => FingerAssignment::new(Right, Ring),
            _ => FingerAssignment::new(Right, Pinky),
        };
    }

    match col {
        0 | 1 => FingerAssignment::new(Left, Pinky),
        2 => FingerAssignment::new(Left, Ring),
        3 => FingerAssignment::new(Left, Middle),
        4 | 5 => FingerAssignment::new(Left, Index),
        6 | 7 => FingerAssignment::new(Right, Index),
        8 => FingerAssignment::new(Right, Middle),
        9 => FingerAssignment::new(Right, Ring),
        _ => FingerAssignment::new(Right, Pinky),
    }
}

/// `"AD07"` -> `("AD", 7)`.
fn split_position(position: &str) -> Option<(&str, u8)> {
    if position.len() != 4 || !position.is_ascii() {
        return None;
    }
    let (row, col) = position.split_at(2);
    let col = col.parse().ok()?;
    Some((row, col))
}
