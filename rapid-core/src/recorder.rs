//! Recording of drawn entropy and the groups that structure it.
//!
//! Every bitstream owns a [`Recorder`]. Generators bracket the draws that
//! make up one logical value in a group; after a failing run the recorded
//! groups tell the shrinker which spans of the buffer can be cut out as a
//! unit. Pruning deletes groups flagged as discarded along with everything
//! nested inside them.

/// Opaque handle returned by `begin_group` and consumed by `end_group`.
///
/// For a persisting recorder this is the group's position in
/// [`Recorder::groups`]. Otherwise it is only a position marker used to
/// detect empty groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupHandle(usize);

impl GroupHandle {
    /// Position of the group in the recorder's group list.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A labelled span `[begin, end)` of recorded words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    begin: usize,
    end: Option<usize>,
    label: String,
    removable: bool,
    discard: bool,
}

impl Group {
    /// Index of the first word drawn inside this group.
    pub fn begin(&self) -> usize {
        self.begin
    }

    /// One past the last word drawn inside this group, `None` while open.
    pub fn end(&self) -> Option<usize> {
        self.end
    }

    /// Name the group was opened with.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether a shrinker may try deleting this group.
    pub fn is_removable(&self) -> bool {
        self.removable
    }

    /// Whether this group is scheduled for deletion by the next prune.
    pub fn is_discarded(&self) -> bool {
        self.discard
    }

    /// Whether `end_group` has been called for this group.
    pub fn is_closed(&self) -> bool {
        self.end.is_some()
    }

    /// Number of words in the span, zero while the group is open.
    pub fn len(&self) -> usize {
        self.end.map_or(0, |end| end - self.begin)
    }

    /// Whether the span holds no words.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `other` lies entirely inside this group's span.
    pub fn contains(&self, other: &Group) -> bool {
        match (self.end, other.end) {
            (Some(end), Some(other_end)) => self.begin <= other.begin && other_end <= end,
            _ => false,
        }
    }
}

/// Entropy log for a single generation attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recorder {
    data: Vec<u64>,
    groups: Vec<Group>,
    data_len: usize,
    persist: bool,
    open: Vec<usize>,
}

impl Recorder {
    /// Create an empty recorder.
    ///
    /// A non-persisting recorder only counts draws, which is enough to catch
    /// empty groups but leaves nothing to shrink.
    pub fn new(persist: bool) -> Self {
        Recorder {
            persist,
            ..Recorder::default()
        }
    }

    /// Whether words and groups are kept for shrinking.
    pub fn is_persisting(&self) -> bool {
        self.persist
    }

    /// Words drawn so far (empty unless persisting).
    pub fn data(&self) -> &[u64] {
        &self.data
    }

    /// Groups in the order they were opened (empty unless persisting).
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Number of words drawn so far, whether persisting or not.
    pub fn data_len(&self) -> usize {
        self.data_len
    }

    /// Consume the recorder, returning the recorded words.
    pub fn into_data(self) -> Vec<u64> {
        self.data
    }

    /// Log one drawn word.
    pub fn record(&mut self, word: u64) {
        if self.persist {
            self.data.push(word);
        }
        self.data_len += 1;
    }

    /// Open a group starting at the current position.
    pub fn begin_group(&mut self, label: &str, removable: bool) -> GroupHandle {
        if !self.persist {
            return GroupHandle(self.data_len);
        }

        self.groups.push(Group {
            begin: self.data.len(),
            end: None,
            label: label.to_string(),
            removable,
            discard: false,
        });
        let index = self.groups.len() - 1;
        self.open.push(index);

        GroupHandle(index)
    }

    /// Close the group opened as `handle`.
    ///
    /// # Panics
    ///
    /// Panics if no words were drawn since the group was opened, or if the
    /// handle does not name the innermost open group.
    pub fn end_group(&mut self, handle: GroupHandle, discard: bool) {
        let GroupHandle(i) = handle;

        if !self.persist {
            assert!(i <= self.data_len, "unknown group handle {i}");
            assert_ne!(
                self.data_len, i,
                "group did not use any data from bitstream"
            );
            return;
        }

        assert!(i < self.groups.len(), "unknown group handle {i}");
        assert!(
            !self.groups[i].is_closed(),
            "group {:?} closed twice",
            self.groups[i].label
        );
        assert_eq!(
            self.open.last(),
            Some(&i),
            "group {:?} closed before the groups nested in it",
            self.groups[i].label
        );
        assert_ne!(
            self.data.len(),
            self.groups[i].begin,
            "group did not use any data from bitstream"
        );

        self.open.pop();
        let group = &mut self.groups[i];
        group.end = Some(self.data.len());
        group.discard = discard;
    }

    /// Flag a closed group for deletion by the next [`prune`](Self::prune).
    pub fn mark_discard(&mut self, handle: GroupHandle) {
        assert!(self.persist, "cannot mark groups of a non-persisting recorder");
        let group = self
            .groups
            .get_mut(handle.0)
            .unwrap_or_else(|| panic!("unknown group handle {}", handle.0));
        assert!(group.is_closed(), "cannot discard open group {:?}", group.label);
        group.discard = true;
    }

    /// Closed groups a shrinker may try deleting, in open order.
    pub fn removal_candidates(&self) -> impl Iterator<Item = GroupHandle> + '_ {
        self.groups
            .iter()
            .enumerate()
            .filter(|(_, g)| g.removable && g.is_closed())
            .map(|(i, _)| GroupHandle(i))
    }

    /// Buffer that results from deleting one group (and whatever is nested
    /// in it) together with every group already flagged as discarded.
    /// The recorder itself is left untouched.
    ///
    /// Already discarded groups are pruned first. Enclosing groups that
    /// then cover exactly the same span as the chosen one go with it, since
    /// they would otherwise be left empty. If the chosen group is itself
    /// pruned away, the result is just the pruned buffer.
    pub fn without_group(&self, handle: GroupHandle) -> Vec<u64> {
        assert!(
            handle.0 < self.groups.len(),
            "unknown group handle {}",
            handle.0
        );
        let kept = self.surviving_groups();

        let mut candidate = self.clone();
        candidate.prune();
        if kept[handle.0] {
            let index = kept[..handle.0].iter().filter(|&&k| k).count();
            let target = candidate.outermost_same_span(GroupHandle(index));
            candidate.mark_discard(target);
            candidate.prune();
        }
        candidate.into_data()
    }

    /// Which groups a prune would leave in place, by current position.
    fn surviving_groups(&self) -> Vec<bool> {
        let mut kept = vec![true; self.groups.len()];
        let mut i = 0;
        while i < self.groups.len() {
            match (self.groups[i].discard, self.groups[i].end) {
                (true, Some(end)) => {
                    let j = self.nested_until(i, end);
                    kept[i..j].fill(false);
                    i = j;
                }
                _ => i += 1,
            }
        }
        kept
    }

    /// First position after `i` whose group is not contained in a span
    /// ending at `end`.
    fn nested_until(&self, i: usize, end: usize) -> usize {
        let mut j = i + 1;
        while j < self.groups.len() && self.groups[j].end.map_or(false, |e| e <= end) {
            j += 1;
        }
        j
    }

    fn outermost_same_span(&self, handle: GroupHandle) -> GroupHandle {
        let Some(target) = self.groups.get(handle.0) else {
            panic!("unknown group handle {}", handle.0);
        };
        let outermost = self.groups[..handle.0]
            .iter()
            .position(|g| g.begin == target.begin && g.end == target.end)
            .unwrap_or(handle.0);
        GroupHandle(outermost)
    }

    /// Delete every discarded group, its words and all groups nested in it,
    /// then shift the remaining groups to match the compacted data.
    ///
    /// # Panics
    ///
    /// Panics if the recorder is not persisting, if any group is still open,
    /// or if deleting a span leaves an enclosing group empty.
    pub fn prune(&mut self) {
        assert!(self.persist, "cannot prune a non-persisting recorder");
        assert!(
            self.open.is_empty(),
            "cannot prune while {} groups are open",
            self.open.len()
        );

        let before = self.data.len();
        let mut removed = 0;
        let mut i = 0;
        while i < self.groups.len() {
            if self.groups[i].discard {
                self.remove_group(i); // O(n^2)
                removed += 1;
            } else {
                i += 1;
            }
        }

        for g in &self.groups {
            assert!(
                !g.is_empty(),
                "group {:?} is empty after pruning",
                g.label
            );
        }

        if removed > 0 {
            tracing::debug!(
                removed,
                words_before = before,
                words_after = self.data.len(),
                "pruned discarded groups"
            );
        }
    }

    fn remove_group(&mut self, i: usize) {
        let begin = self.groups[i].begin;
        let Some(end) = self.groups[i].end else {
            panic!("cannot remove open group {:?}", self.groups[i].label);
        };

        let j = self.nested_until(i, end);

        tracing::trace!(
            label = %self.groups[i].label,
            begin,
            end,
            nested = j - i - 1,
            "removing group"
        );

        self.data.drain(begin..end);
        self.groups.drain(i..j);

        let n = end - begin;
        self.data_len -= n;
        for g in &mut self.groups {
            if g.begin >= end {
                g.begin -= n;
            }
            if let Some(e) = g.end.as_mut() {
                if *e >= end {
                    *e -= n;
                }
            }
        }
    }
}
