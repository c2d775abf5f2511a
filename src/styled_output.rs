//! Styled terminal output for credsift using anstyle.
//!
//! Renders a `CredentialAnalysis` as a sectioned, coloured summary: one
//! section per output type, followed by run statistics and warnings.
//! Colours are dropped when stdout is not a terminal or `NO_COLOR` is set.

use anstyle::{AnsiColor, Color, Style};
use std::fmt::Write;
use std::io::{self, Write as IoWrite};

use crate::aggregate::ExtractionSource;
use crate::facade::CredentialAnalysis;
use crate::format::{FormattedRecord, RecordDetails, RecordType};

const RULE: &str =
    "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Style definitions for different UI elements
pub struct Styles {
    pub header: Style,
    pub subheader: Style,
    pub warning: Style,
    pub info: Style,
    pub muted: Style,
    pub bold: Style,
    pub secret: Style,
    pub url: Style,
    pub confidence_high: Style,
    pub confidence_medium: Style,
    pub confidence_low: Style,
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            header: Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Blue))),
            subheader: Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
            warning: Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
            info: Style::new().fg_color(Some(Color::Ansi(AnsiColor::Blue))),
            muted: Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))),
            bold: Style::new().bold(),
            secret: Style::new().fg_color(Some(Color::Ansi(AnsiColor::Magenta))),
            url: Style::new()
                .fg_color(Some(Color::Ansi(AnsiColor::Blue)))
                .underline(),
            confidence_high: Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
            confidence_medium: Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
            confidence_low: Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red))),
        }
    }
}

/// Styled output formatter for analysis results
pub struct StyledFormatter {
    styles: Styles,
    use_colors: bool,
}

impl StyledFormatter {
    pub fn new() -> Self {
        Self::with_styles(Styles::default())
    }

    pub fn with_styles(styles: Styles) -> Self {
        Self {
            styles,
            use_colors: Self::should_use_colors(),
        }
    }

    /// Create a formatter without colors (for non-interactive use)
    pub fn without_colors() -> Self {
        Self {
            styles: Styles::default(),
            use_colors: false,
        }
    }

    fn should_use_colors() -> bool {
        atty::is(atty::Stream::Stdout) && std::env::var("NO_COLOR").is_err()
    }

    /// Apply style to text if colors are enabled
    fn styled(&self, text: &str, style: &Style) -> String {
        if self.use_colors {
            format!("{}{}{}", style.render(), text, style.render_reset())
        } else {
            text.to_string()
        }
    }

    pub fn format_analysis(&self, analysis: &CredentialAnalysis) -> Result<String, std::fmt::Error> {
        let mut output = String::new();
        self.write_header(&mut output, analysis)?;

        if analysis.is_empty() {
            writeln!(output)?;
            writeln!(
                output,
                "  {} {}",
                self.styled("⚠️", &self.styles.warning),
                self.styled("No migration credentials found", &self.styles.warning)
            )?;
        } else {
            let categories = analysis.categorize();
            for record_type in RecordType::ALL {
                let records = categories.bucket(record_type);
                if !records.is_empty() {
                    self.write_section(&mut output, record_type, records, analysis)?;
                }
            }
        }

        self.write_footer(&mut output, analysis)?;
        Ok(output)
    }

    fn write_header(
        &self,
        output: &mut String,
        analysis: &CredentialAnalysis,
    ) -> Result<(), std::fmt::Error> {
        writeln!(output)?;
        writeln!(output, "{}", self.styled(RULE, &self.styles.muted))?;
        let title = format!("🔑 Migration credentials ({} found)", analysis.len());
        writeln!(output, "  {}", self.styled(&title, &self.styles.header))?;

        if let Some(client) = &analysis.client {
            let label = match (&client.name, &client.id) {
                (Some(name), Some(id)) => format!("{name} ({id})"),
                (Some(name), None) => name.clone(),
                (None, Some(id)) => id.clone(),
                (None, None) => String::new(),
            };
            if !label.is_empty() {
                writeln!(
                    output,
                    "  {} Client: {}",
                    self.styled("👤", &self.styles.info),
                    self.styled(&label, &self.styles.bold)
                )?;
            }
            if let Some(ticket) = &client.ticket_id {
                writeln!(
                    output,
                    "  {} Ticket: {}",
                    self.styled("🎫", &self.styles.info),
                    self.styled(ticket, &self.styles.bold)
                )?;
            }
        }

        writeln!(output, "{}", self.styled(RULE, &self.styles.muted))?;
        Ok(())
    }

    fn write_section(
        &self,
        output: &mut String,
        record_type: RecordType,
        records: &[FormattedRecord],
        analysis: &CredentialAnalysis,
    ) -> Result<(), std::fmt::Error> {
        let title = match record_type {
            RecordType::Ftp => "📁 FTP accounts",
            RecordType::Website => "🌐 Websites",
            RecordType::Domain => "🏷️ Domains",
            RecordType::Email => "📮 Mailboxes",
            RecordType::Generic => "🔐 Other credentials",
        };
        writeln!(output)?;
        writeln!(output, "  {}", self.styled(title, &self.styles.subheader))?;
        writeln!(output)?;

        for (i, record) in records.iter().enumerate() {
            let marker = if record.confidence < analysis.options.confidence_threshold {
                " (below threshold)"
            } else {
                ""
            };
            writeln!(
                output,
                "    {} {} {}{}",
                self.styled(&format!("{}.", i + 1), &self.styles.muted),
                self.styled(&record.details.summary(), &self.styles.bold),
                self.styled(
                    &format!("[{:.1}]", record.confidence),
                    self.confidence_style(record.confidence)
                ),
                self.styled(marker, &self.styles.muted)
            )?;
            let fields = self.detail_lines(&record.details);
            for (j, (label, value, style)) in fields.iter().enumerate() {
                let branch = if j + 1 == fields.len() { "└─" } else { "├─" };
                writeln!(
                    output,
                    "       {} {}: {}",
                    self.styled(branch, &self.styles.muted),
                    label,
                    self.styled(value, style)
                )?;
            }
        }
        Ok(())
    }

    fn detail_lines<'s>(&'s self, details: &RecordDetails) -> Vec<(&'static str, String, &'s Style)> {
        let s = &self.styles;
        let mut lines = Vec::new();
        let mut push = |label: &'static str, value: Option<String>, style: &'s Style| {
            if let Some(v) = value {
                lines.push((label, v, style));
            }
        };
        match details {
            RecordDetails::Ftp(f) => {
                push("Password", f.password.clone(), &s.secret);
                push("Port", Some(f.port.to_string()), &s.bold);
            }
            RecordDetails::Website(w) => {
                push("URL", Some(w.url.clone()), &s.url);
                push("Username", w.username.clone(), &s.bold);
                push("Password", w.password.clone(), &s.secret);
                push("CMS", w.cms.clone(), &s.info);
            }
            RecordDetails::Domain(d) => {
                if !d.nameservers.is_empty() {
                    push("Nameservers", Some(d.nameservers.join(", ")), &s.info);
                }
                if !d.dns_records.is_empty() {
                    push("DNS records", Some(d.dns_records.len().to_string()), &s.bold);
                }
            }
            RecordDetails::Email(e) => {
                push("Password", e.password.clone(), &s.secret);
                push("Server", e.server.clone(), &s.info);
                push(
                    "Ports",
                    Some(format!(
                        "IMAP {} / SMTP {} / POP3 {} ({})",
                        e.imap_port, e.smtp_port, e.pop3_port, e.encryption
                    )),
                    &s.muted,
                );
            }
            RecordDetails::Generic(g) => {
                push("Password", g.password.clone(), &s.secret);
            }
        }
        lines
    }

    fn confidence_style(&self, confidence: f64) -> &Style {
        if confidence >= 0.9 {
            &self.styles.confidence_high
        } else if confidence >= 0.7 {
            &self.styles.confidence_medium
        } else {
            &self.styles.confidence_low
        }
    }

    fn write_footer(
        &self,
        output: &mut String,
        analysis: &CredentialAnalysis,
    ) -> Result<(), std::fmt::Error> {
        let stats = &analysis.stats;
        writeln!(output)?;
        writeln!(output, "{}", self.styled(RULE, &self.styles.muted))?;
        writeln!(
            output,
            "  {} Run Statistics:",
            self.styled("📊", &self.styles.info)
        )?;
        let source = match stats.source {
            ExtractionSource::Heuristic => "heuristic extractors",
            ExtractionSource::Remote => "remote inference",
            ExtractionSource::HeuristicFallback => "heuristic extractors (remote fallback)",
        };
        writeln!(
            output,
            "    {} Source: {}",
            self.styled("├─", &self.styles.muted),
            self.styled(source, &self.styles.bold)
        )?;
        writeln!(
            output,
            "    {} Duplicates removed: {}",
            self.styled("├─", &self.styles.muted),
            self.styled(&stats.duplicates_removed.to_string(), &self.styles.bold)
        )?;
        writeln!(
            output,
            "    {} Total time: {}ms",
            self.styled("└─", &self.styles.muted),
            self.styled(&stats.duration_ms.to_string(), &self.styles.bold)
        )?;

        if !stats.warnings.is_empty() {
            writeln!(output)?;
            writeln!(
                output,
                "  {} Warnings:",
                self.styled("⚠️", &self.styles.warning)
            )?;
            for warning in &stats.warnings {
                writeln!(
                    output,
                    "    {} {}",
                    self.styled("•", &self.styles.warning),
                    self.styled(warning, &self.styles.warning)
                )?;
            }
        }

        writeln!(output, "{}", self.styled(RULE, &self.styles.muted))?;
        Ok(())
    }

    /// Print the analysis to stdout
    pub fn print_analysis(&self, analysis: &CredentialAnalysis) -> io::Result<()> {
        let formatted = self
            .format_analysis(analysis)
            .map_err(|e| io::Error::other(format!("{}", e)))?;
        print!("{}", formatted);
        io::stdout().flush()?;
        Ok(())
    }
}

impl Default for StyledFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisOptions;
    use crate::candidate::ClientContext;
    use crate::config::WindowConfig;
    use crate::facade::CredentialExtractor;

    fn analysis(text: &str) -> CredentialAnalysis {
        let client = ClientContext::new(Some("Firma".into()), None, Some("T-42".into()));
        CredentialExtractor::heuristic_only(WindowConfig::default())
            .analyze_offline(text, Some(&client), &AnalysisOptions::default())
            .unwrap()
    }

    #[test]
    fn test_styled_formatter_creation() {
        let formatter = StyledFormatter::new();
        assert!(formatter.use_colors || !atty::is(atty::Stream::Stdout));
    }

    #[test]
    fn test_analysis_formatting() {
        let formatter = StyledFormatter::without_colors();
        let output = formatter
            .format_analysis(&analysis(
                "serwer FTP: ftp.firma.pl\nlogin: jan\nhasło: Tajne123",
            ))
            .unwrap();

        assert!(output.contains("FTP accounts"));
        assert!(output.contains("jan@ftp.firma.pl:21"));
        assert!(output.contains("Tajne123"));
        assert!(output.contains("Client: Firma"));
        assert!(output.contains("Ticket: T-42"));
        assert!(!output.contains("\u{1b}["));
    }

    #[test]
    fn test_empty_analysis_formatting() {
        let output = StyledFormatter::without_colors()
            .format_analysis(&analysis("Proszę o kontakt telefoniczny."))
            .unwrap();
        assert!(output.contains("No migration credentials found"));
        assert!(output.contains("Warnings:"));
    }
}
