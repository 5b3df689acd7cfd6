// 🎚️ Dashboard controls - year slider (with play mode) and country multiselect
// Plain state machines; the terminal UI maps keys onto them.

use crate::filter::Selection;

/// Year slider bounded by the data's min/max year
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearSlider {
    min: i32,
    max: i32,
    value: i32,
    pub playing: bool,
}

impl YearSlider {
    /// Starts at the minimum year
    pub fn new(min: i32, max: i32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        YearSlider {
            min,
            max,
            value: min,
            playing: false,
        }
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn bounds(&self) -> (i32, i32) {
        (self.min, self.max)
    }

    pub fn set(&mut self, year: i32) {
        self.value = year.clamp(self.min, self.max);
    }

    pub fn step_forward(&mut self, step: i32) {
        self.set(self.value.saturating_add(step));
    }

    pub fn step_back(&mut self, step: i32) {
        self.set(self.value.saturating_sub(step));
    }

    pub fn toggle_play(&mut self) {
        self.playing = !self.playing;
    }

    /// Advance one year while playing, wrapping from max back to min
    pub fn tick(&mut self) {
        if !self.playing {
            return;
        }
        self.value = if self.value >= self.max {
            self.min
        } else {
            self.value + 1
        };
    }

    /// Position of the current year in [0, 1]
    pub fn ratio(&self) -> f64 {
        if self.max == self.min {
            return 1.0;
        }
        (self.value as f64 - self.min as f64) / (self.max as f64 - self.min as f64)
    }
}

/// Multiselect over every country in the data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryPicker {
    options: Vec<String>,
    /// Selected names in the order they were picked
    selected: Vec<String>,
    cursor: usize,
}

impl CountryPicker {
    /// Unknown names in `defaults` are ignored
    pub fn new(options: Vec<String>, defaults: &[String]) -> Self {
        let selected = defaults
            .iter()
            .filter(|d| options.contains(d))
            .cloned()
            .collect();

        let cursor = defaults
            .first()
            .and_then(|d| options.iter().position(|o| o == d))
            .unwrap_or(0);

        CountryPicker {
            options,
            selected,
            cursor,
        }
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_selected(&self, country: &str) -> bool {
        self.selected.iter().any(|s| s == country)
    }

    pub fn toggle(&mut self, country: &str) {
        if let Some(pos) = self.selected.iter().position(|s| s == country) {
            self.selected.remove(pos);
        } else if self.options.iter().any(|o| o == country) {
            self.selected.push(country.to_string());
        }
    }

    pub fn toggle_current(&mut self) {
        if let Some(country) = self.options.get(self.cursor).cloned() {
            self.toggle(&country);
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn next(&mut self) {
        if self.options.is_empty() {
            return;
        }
        self.cursor = if self.cursor >= self.options.len() - 1 {
            0
        } else {
            self.cursor + 1
        };
    }

    pub fn previous(&mut self) {
        if self.options.is_empty() {
            return;
        }
        self.cursor = if self.cursor == 0 {
            self.options.len() - 1
        } else {
            self.cursor - 1
        };
    }

    /// Jump the cursor to the first option starting with `prefix`
    pub fn jump_to(&mut self, prefix: &str) {
        let prefix = prefix.to_lowercase();
        if let Some(pos) = self
            .options
            .iter()
            .position(|o| o.to_lowercase().starts_with(&prefix))
        {
            self.cursor = pos;
        }
    }
}

/// Current filter for the chart
pub fn current_selection(slider: &YearSlider, picker: &CountryPicker) -> Selection {
    Selection::new(slider.value(), picker.selected().iter().cloned())
}
