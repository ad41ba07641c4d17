/*!
 * Per-call codec configuration.
 *
 * Options are plain values handed to each call; the codec keeps no global
 * settings.
 */

/// What non-strict encoding does with a value outside the signal's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutOfRange {
    /// Drop the value and encode the signal's default instead.
    #[default]
    Omit,
    /// Clamp to the declared bounds and the field's representable range.
    Clamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Fail on missing, unknown, inactive or out-of-range values.
    pub strict: bool,
    /// Values are physical (`true`) or raw integers (`false`).
    pub scaling: bool,
    /// Set bits not covered by an active signal to 1 instead of 0.
    pub padding: bool,
    /// Recovery for out-of-range values when not strict.
    pub out_of_range: OutOfRange,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            strict: true,
            scaling: true,
            padding: false,
            out_of_range: OutOfRange::Omit,
        }
    }
}

impl EncodeOptions {
    /// Defaults with `strict` turned off.
    pub fn lenient() -> Self {
        Self::default().strict(false)
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn scaling(mut self, scaling: bool) -> Self {
        self.scaling = scaling;
        self
    }

    pub fn padding(mut self, padding: bool) -> Self {
        self.padding = padding;
        self
    }

    pub fn out_of_range(mut self, policy: OutOfRange) -> Self {
        self.out_of_range = policy;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Return choice labels instead of numbers where a choice matches.
    pub decode_choices: bool,
    /// Return physical (`true`) or raw (`false`) values.
    pub scaling: bool,
    /// Accept a short buffer and decode only the signals it fully contains.
    pub allow_truncated: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            decode_choices: true,
            scaling: true,
            allow_truncated: false,
        }
    }
}

impl DecodeOptions {
    pub fn decode_choices(mut self, decode_choices: bool) -> Self {
        self.decode_choices = decode_choices;
        self
    }

    pub fn scaling(mut self, scaling: bool) -> Self {
        self.scaling = scaling;
        self
    }

    pub fn allow_truncated(mut self, allow_truncated: bool) -> Self {
        self.allow_truncated = allow_truncated;
        self
    }
}
