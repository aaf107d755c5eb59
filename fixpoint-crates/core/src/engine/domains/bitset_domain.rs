use super::DomainSnapshot;
use super::EmptyDomain;
use crate::engine::notifications::DomainEvent;
use crate::fixpoint_assert_extreme;
use crate::fixpoint_assert_simple;

const WORD_BITS: usize = u64::BITS as usize;

/// An enumerated domain stored as one bit per value.
///
/// The bounds are kept explicitly and are always values of the domain; a bit outside of
/// `[lower_bound, upper_bound]` carries no meaning. Raising a bound therefore never touches the
/// bits, only interior removals clear them.
#[derive(Clone, Debug)]
pub(crate) struct BitsetDomain {
    offset: i32,
    words: Vec<u64>,
    lower_bound: i32,
    upper_bound: i32,
    size: u32,
}

impl BitsetDomain {
    pub(crate) fn new(lower_bound: i32, upper_bound: i32) -> BitsetDomain {
        fixpoint_assert_simple!(
            lower_bound <= upper_bound,
            "cannot create the empty domain [{lower_bound}, {upper_bound}]"
        );

        let span = upper_bound as i64 - lower_bound as i64 + 1;
        fixpoint_assert_simple!(
            span <= u32::MAX as i64,
            "the domain [{lower_bound}, {upper_bound}] has more values than a bitset can count"
        );
        let num_bits = span as usize;
        let mut words = vec![u64::MAX; num_bits.div_ceil(WORD_BITS)];
        if num_bits % WORD_BITS != 0 {
            if let Some(last) = words.last_mut() {
                *last = (1_u64 << (num_bits % WORD_BITS)) - 1;
            }
        }

        BitsetDomain {
            offset: lower_bound,
            words,
            lower_bound,
            upper_bound,
            size: num_bits as u32,
        }
    }

    /// Creates a domain containing exactly `values` (duplicates are ignored).
    pub(crate) fn from_values(values: &[i32]) -> BitsetDomain {
        let lower_bound = values.iter().copied().min();
        let upper_bound = values.iter().copied().max();
        let (Some(lower_bound), Some(upper_bound)) = (lower_bound, upper_bound) else {
            panic!("cannot create a domain without values");
        };

        let mut domain = BitsetDomain::new(lower_bound, upper_bound);
        domain.words.iter_mut().for_each(|word| *word = 0);
        domain.size = 0;
        for &value in values {
            let index = domain.index_of(value);
            if !domain.bit(index) {
                domain.set_bit(index);
                domain.size += 1;
            }
        }

        domain
    }

    pub(crate) fn lower_bound(&self) -> i32 {
        self.lower_bound
    }

    pub(crate) fn upper_bound(&self) -> i32 {
        self.upper_bound
    }

    pub(crate) fn size(&self) -> u32 {
        self.size
    }

    pub(crate) fn contains(&self, value: i32) -> bool {
        self.lower_bound <= value && value <= self.upper_bound && self.bit(self.index_of(value))
    }

    /// The smallest value in the domain which is strictly larger than `value`.
    pub(crate) fn next_value(&self, value: i32) -> Option<i32> {
        if value >= self.upper_bound {
            return None;
        }
        if value < self.lower_bound {
            return Some(self.lower_bound);
        }

        self.next_set_bit(self.index_of(value) + 1, self.index_of(self.upper_bound))
            .map(|index| self.value_of(index))
    }

    /// The largest value in the domain which is strictly smaller than `value`.
    pub(crate) fn previous_value(&self, value: i32) -> Option<i32> {
        if value <= self.lower_bound {
            return None;
        }
        if value > self.upper_bound {
            return Some(self.upper_bound);
        }

        self.previous_set_bit(self.index_of(value) - 1, self.index_of(self.lower_bound))
            .map(|index| self.value_of(index))
    }

    /// The last value of the contiguous run of values which starts at `start`.
    pub(crate) fn range_end(&self, start: i32) -> i32 {
        let mut end = start;
        while end < self.upper_bound && self.bit(self.index_of(end) + 1) {
            end += 1;
        }
        end
    }

    /// The first value of the contiguous run of values which ends at `end`.
    pub(crate) fn range_start(&self, end: i32) -> i32 {
        let mut start = end;
        while start > self.lower_bound && self.bit(self.index_of(start) - 1) {
            start -= 1;
        }
        start
    }

    pub(crate) fn remove(&mut self, value: i32) -> Result<Option<DomainEvent>, EmptyDomain> {
        if !self.contains(value) {
            return Ok(None);
        }
        if self.size == 1 {
            return Err(EmptyDomain::LastValueRemoved);
        }

        let before = self.snapshot();
        self.clear_bit(self.index_of(value));
        self.size -= 1;

        if value == self.lower_bound {
            self.lower_bound = self.first_value_from(value);
        }
        if value == self.upper_bound {
            self.upper_bound = self.last_value_from(value);
        }

        Ok(Some(self.classify(before)))
    }

    pub(crate) fn remove_interval(
        &mut self,
        from: i32,
        to: i32,
    ) -> Result<Option<DomainEvent>, EmptyDomain> {
        let from = from.max(self.lower_bound);
        let to = to.min(self.upper_bound);
        if from > to {
            return Ok(None);
        }

        let from_index = self.index_of(from);
        let to_index = self.index_of(to);
        let num_removed = self.count_set_bits(from_index, to_index);
        if num_removed == 0 {
            return Ok(None);
        }
        if num_removed == self.size {
            return Err(EmptyDomain::AllValuesRemoved);
        }

        let before = self.snapshot();
        for index in from_index..=to_index {
            self.clear_bit(index);
        }
        self.size -= num_removed;

        if from == self.lower_bound {
            self.lower_bound = self.first_value_from(to);
        }
        if to == self.upper_bound {
            self.upper_bound = self.last_value_from(from);
        }

        Ok(Some(self.classify(before)))
    }

    pub(crate) fn set_lower_bound(
        &mut self,
        value: i32,
    ) -> Result<Option<DomainEvent>, EmptyDomain> {
        if value <= self.lower_bound {
            return Ok(None);
        }
        if value > self.upper_bound {
            return Err(EmptyDomain::BoundsCrossed);
        }

        let before = self.snapshot();
        let new_lower_bound = if self.bit(self.index_of(value)) {
            value
        } else {
            self.first_value_from(value)
        };
        self.size -= self.count_set_bits(
            self.index_of(self.lower_bound),
            self.index_of(new_lower_bound) - 1,
        );
        self.lower_bound = new_lower_bound;

        Ok(Some(self.classify(before)))
    }

    pub(crate) fn set_upper_bound(
        &mut self,
        value: i32,
    ) -> Result<Option<DomainEvent>, EmptyDomain> {
        if value >= self.upper_bound {
            return Ok(None);
        }
        if value < self.lower_bound {
            return Err(EmptyDomain::BoundsCrossed);
        }

        let before = self.snapshot();
        let new_upper_bound = if self.bit(self.index_of(value)) {
            value
        } else {
            self.last_value_from(value)
        };
        self.size -= self.count_set_bits(
            self.index_of(new_upper_bound) + 1,
            self.index_of(self.upper_bound),
        );
        self.upper_bound = new_upper_bound;

        Ok(Some(self.classify(before)))
    }

    pub(crate) fn instantiate(&mut self, value: i32) -> Result<Option<DomainEvent>, EmptyDomain> {
        if !self.contains(value) {
            return Err(EmptyDomain::ValueNotInDomain);
        }
        if self.size == 1 {
            return Ok(None);
        }

        self.lower_bound = value;
        self.upper_bound = value;
        self.size = 1;

        Ok(Some(DomainEvent::Instantiate))
    }

    pub(crate) fn snapshot(&self) -> DomainSnapshot {
        DomainSnapshot {
            lower_bound: self.lower_bound,
            upper_bound: self.upper_bound,
            size: self.size,
        }
    }

    pub(crate) fn restore(&mut self, snapshot: DomainSnapshot) {
        self.lower_bound = snapshot.lower_bound;
        self.upper_bound = snapshot.upper_bound;
        self.size = snapshot.size;

        fixpoint_assert_extreme!(
            self.count_set_bits(
                self.index_of(self.lower_bound),
                self.index_of(self.upper_bound)
            ) == self.size
        );
    }

    /// Sets the bit of a value which was cleared by an interior removal.
    pub(crate) fn reinsert(&mut self, value: i32) {
        self.set_bit(self.index_of(value));
    }

    fn classify(&self, before: DomainSnapshot) -> DomainEvent {
        if self.size == 1 {
            DomainEvent::Instantiate
        } else if self.lower_bound != before.lower_bound {
            DomainEvent::LowerBound
        } else if self.upper_bound != before.upper_bound {
            DomainEvent::UpperBound
        } else {
            DomainEvent::Removal
        }
    }

    /// The smallest value `>= value` whose bit is set; only called when such a value is known to
    /// exist below the upper bound.
    fn first_value_from(&self, value: i32) -> i32 {
        let index = self
            .next_set_bit(self.index_of(value), self.index_of(self.upper_bound))
            .unwrap_or_else(|| self.index_of(self.upper_bound));
        self.value_of(index)
    }

    /// The largest value `<= value` whose bit is set; only called when such a value is known to
    /// exist above the lower bound.
    fn last_value_from(&self, value: i32) -> i32 {
        let index = self
            .previous_set_bit(self.index_of(value), self.index_of(self.lower_bound))
            .unwrap_or_else(|| self.index_of(self.lower_bound));
        self.value_of(index)
    }

    fn index_of(&self, value: i32) -> usize {
        (value as i64 - self.offset as i64) as usize
    }

    fn value_of(&self, index: usize) -> i32 {
        (self.offset as i64 + index as i64) as i32
    }

    fn bit(&self, index: usize) -> bool {
        (self.words[index / WORD_BITS] >> (index % WORD_BITS)) & 1 == 1
    }

    fn set_bit(&mut self, index: usize) {
        self.words[index / WORD_BITS] |= 1 << (index % WORD_BITS);
    }

    fn clear_bit(&mut self, index: usize) {
        self.words[index / WORD_BITS] &= !(1 << (index % WORD_BITS));
    }

    fn next_set_bit(&self, from: usize, limit: usize) -> Option<usize> {
        if from > limit {
            return None;
        }

        let mut word_index = from / WORD_BITS;
        let mut word = self.words[word_index] & (u64::MAX << (from % WORD_BITS));
        loop {
            if word != 0 {
                let index = word_index * WORD_BITS + word.trailing_zeros() as usize;
                return (index <= limit).then_some(index);
            }
            word_index += 1;
            if word_index * WORD_BITS > limit {
                return None;
            }
            word = self.words[word_index];
        }
    }

    fn previous_set_bit(&self, from: usize, limit: usize) -> Option<usize> {
        if from < limit {
            return None;
        }

        let mut word_index = from / WORD_BITS;
        let mut word = self.words[word_index] & (u64::MAX >> (WORD_BITS - 1 - from % WORD_BITS));
        loop {
            if word != 0 {
                let highest = WORD_BITS - 1 - word.leading_zeros() as usize;
                let index = word_index * WORD_BITS + highest;
                return (index >= limit).then_some(index);
            }
            if word_index * WORD_BITS <= limit {
                return None;
            }
            word_index -= 1;
            word = self.words[word_index];
        }
    }

    /// The number of set bits with an index in `[from, to]`.
    fn count_set_bits(&self, from: usize, to: usize) -> u32 {
        if from > to {
            return 0;
        }

        let first_word = from / WORD_BITS;
        let last_word = to / WORD_BITS;
        (first_word..=last_word)
            .map(|word_index| {
                let mut word = self.words[word_index];
                if word_index == first_word {
                    word &= u64::MAX << (from % WORD_BITS);
                }
                if word_index == last_word {
                    word &= u64::MAX >> (WORD_BITS - 1 - to % WORD_BITS);
                }
                word.count_ones()
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(domain: &BitsetDomain) -> Vec<i32> {
        std::iter::successors(Some(domain.lower_bound()), |&value| {
            domain.next_value(value)
        })
        .collect()
    }

    #[test]
    #[should_panic(expected = "more values than a bitset can count")]
    fn the_full_integer_range_is_rejected() {
        let _ = BitsetDomain::new(i32::MIN, i32::MAX);
    }

    #[test]
    fn a_new_domain_contains_the_full_range() {
        let domain = BitsetDomain::new(-3, 70);

        assert_eq!(74, domain.size());
        assert!(domain.contains(-3));
        assert!(domain.contains(64));
        assert!(domain.contains(70));
        assert!(!domain.contains(71));
    }

    #[test]
    fn removing_an_interior_value_is_a_removal_event() {
        let mut domain = BitsetDomain::new(1, 5);

        let event = domain.remove(3).expect("non-empty");

        assert_eq!(Some(DomainEvent::Removal), event);
        assert_eq!(vec![1, 2, 4, 5], values(&domain));
    }

    #[test]
    fn removing_the_lower_bound_skips_holes() {
        let mut domain = BitsetDomain::from_values(&[2, 5, 9, 10]);

        let event = domain.remove(2).expect("non-empty");

        assert_eq!(Some(DomainEvent::LowerBound), event);
        assert_eq!(5, domain.lower_bound());
    }

    #[test]
    fn removing_an_absent_value_is_a_no_op() {
        let mut domain = BitsetDomain::from_values(&[2, 5, 9]);

        assert_eq!(Ok(None), domain.remove(3));
        assert_eq!(Ok(None), domain.remove(100));
        assert_eq!(3, domain.size());
    }

    #[test]
    fn removing_the_last_value_fails_without_changing_the_domain() {
        let mut domain = BitsetDomain::new(4, 4);

        assert_eq!(Err(EmptyDomain::LastValueRemoved), domain.remove(4));
        assert!(domain.contains(4));
    }

    #[test]
    fn bounds_land_on_values_of_the_domain() {
        let mut domain = BitsetDomain::from_values(&[1, 4, 8, 12]);

        assert_eq!(Ok(Some(DomainEvent::LowerBound)), domain.set_lower_bound(2));
        assert_eq!(4, domain.lower_bound());
        assert_eq!(
            Ok(Some(DomainEvent::UpperBound)),
            domain.set_upper_bound(11)
        );
        assert_eq!(8, domain.upper_bound());
        assert_eq!(2, domain.size());
    }

    #[test]
    fn bound_updates_which_leave_one_value_instantiate() {
        let mut domain = BitsetDomain::new(1, 5);

        assert_eq!(Ok(Some(DomainEvent::LowerBound)), domain.set_lower_bound(3));
        assert_eq!(
            Ok(Some(DomainEvent::Instantiate)),
            domain.set_upper_bound(3)
        );
        assert_eq!(1, domain.size());
    }

    #[test]
    fn crossing_bounds_fails() {
        let mut domain = BitsetDomain::new(0, 0);

        assert_eq!(Err(EmptyDomain::BoundsCrossed), domain.set_lower_bound(1));
        assert_eq!(Err(EmptyDomain::BoundsCrossed), domain.set_upper_bound(-1));
    }

    #[test]
    fn instantiating_checks_membership() {
        let mut domain = BitsetDomain::from_values(&[1, 3, 5]);

        assert_eq!(Err(EmptyDomain::ValueNotInDomain), domain.instantiate(2));
        assert_eq!(Ok(Some(DomainEvent::Instantiate)), domain.instantiate(3));
        assert_eq!(Ok(None), domain.instantiate(3));
        assert_eq!(Err(EmptyDomain::ValueNotInDomain), domain.instantiate(5));
    }

    #[test]
    fn removing_an_interval_across_words() {
        let mut domain = BitsetDomain::new(0, 200);

        let event = domain.remove_interval(60, 130).expect("non-empty");

        assert_eq!(Some(DomainEvent::Removal), event);
        assert_eq!(130, domain.size());
        assert_eq!(Some(131), domain.next_value(59));
        assert_eq!(Some(59), domain.previous_value(131));
    }

    #[test]
    fn removing_every_value_through_an_interval_fails() {
        let mut domain = BitsetDomain::from_values(&[3, 4, 7]);

        assert_eq!(
            Err(EmptyDomain::AllValuesRemoved),
            domain.remove_interval(0, 10)
        );
        assert_eq!(3, domain.size());
    }

    #[test]
    fn restoring_a_snapshot_after_reinserting_bits() {
        let mut domain = BitsetDomain::new(0, 9);
        let snapshot = domain.snapshot();

        let _ = domain.remove(4).expect("non-empty");
        let _ = domain.set_lower_bound(6).expect("non-empty");
        domain.reinsert(4);
        domain.restore(snapshot);

        assert_eq!((0..=9).collect::<Vec<_>>(), values(&domain));
    }

    #[test]
    fn ranges_are_maximal() {
        let domain = BitsetDomain::from_values(&[1, 2, 3, 6, 7, 9]);

        assert_eq!(3, domain.range_end(1));
        assert_eq!(7, domain.range_end(6));
        assert_eq!(6, domain.range_start(7));
        assert_eq!(9, domain.range_start(9));
    }
}
