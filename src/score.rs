use crate::constants::{BLINKING_BONUS, INITIAL_WORM_LEN};

pub fn base_score(worm_len: usize) -> i32 {
    worm_len as i32 - INITIAL_WORM_LEN as i32
}

pub fn final_score(base_score: i32, blinking_items_eaten: u32) -> i32 {
    base_score + blinking_items_eaten as i32 * BLINKING_BONUS
}

#[cfg(test)]
mod tests {
    use super::{base_score, final_score};

    #[test]
    fn final_score_adds_three_per_blinking_item() {
        assert_eq!(final_score(7, 2), 13);
        assert_eq!(final_score(0, 0), 0);
        assert_eq!(final_score(-1, 1), 2);
    }

    #[test]
    fn base_score_is_growth_over_initial_length() {
        assert_eq!(base_score(3), 0);
        assert_eq!(base_score(10), 7);
    }
}
