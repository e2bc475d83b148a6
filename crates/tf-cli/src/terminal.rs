//! Line-based prompts on a terminal
//!
//! Entity selections list candidates from the live document by index. Typing
//! `c` (or closing input) cancels; an empty line accepts a choice's default.

use std::io::{self, BufRead, Write};

use tf_cad::kernel::FaceView;
use tf_cad::{
    Answer, BodyId, CadDocument, EntityFilter, EntityRef, FaceId, MemoryDocument, Surface,
};

enum Candidate {
    Body(BodyId),
    Face(FaceId),
}

pub struct Terminal<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Next trimmed input line, `None` at end of input
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    pub fn notify(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "{}", message)
    }

    /// Ask for an entity of the filtered kind, re-prompting on bad input
    pub fn select_entity(
        &mut self,
        doc: &MemoryDocument,
        prompt: &str,
        filter: EntityFilter,
    ) -> io::Result<Answer> {
        let candidates = list_candidates(doc, filter);

        loop {
            writeln!(self.output, "{}", prompt)?;
            for (i, (_, label)) in candidates.iter().enumerate() {
                writeln!(self.output, "  [{}] {}", i, label)?;
            }
            write!(self.output, "index (c to cancel)> ")?;
            self.output.flush()?;

            let Some(line) = self.read_line()? else {
                return Ok(Answer::Cancelled);
            };
            if line.eq_ignore_ascii_case("c") {
                return Ok(Answer::Cancelled);
            }

            match line.parse::<usize>().ok().and_then(|i| candidates.get(i)) {
                Some((Candidate::Body(id), _)) => return Ok(Answer::Entity(EntityRef::Body(*id))),
                Some((Candidate::Face(id), _)) => return Ok(Answer::Entity(EntityRef::Face(*id))),
                None => writeln!(self.output, "'{}' is not one of the listed indices", line)?,
            }
        }
    }

    /// Ask for a text value; an empty line takes `default`
    pub fn prompt_choice(&mut self, title: &str, message: &str, default: &str) -> io::Result<Answer> {
        writeln!(self.output, "== {} ==", title)?;
        writeln!(self.output, "{}", message.trim_end())?;
        write!(self.output, "[{}] (c to cancel)> ", default)?;
        self.output.flush()?;

        Ok(match self.read_line()? {
            None => Answer::Cancelled,
            Some(line) if line.eq_ignore_ascii_case("c") => Answer::Cancelled,
            Some(line) if line.is_empty() => Answer::Text(default.to_string()),
            Some(line) => Answer::Text(line),
        })
    }
}

fn list_candidates(doc: &MemoryDocument, filter: EntityFilter) -> Vec<(Candidate, String)> {
    match filter {
        EntityFilter::Bodies => doc
            .bodies()
            .filter(|b| !b.consumed)
            .map(|b| (Candidate::Body(b.id), b.name.to_string()))
            .collect(),
        EntityFilter::Faces => doc
            .faces()
            .map(|f| {
                let label = face_label(doc, &f);
                (Candidate::Face(f.id), label)
            })
            .collect(),
    }
}

fn face_label(doc: &MemoryDocument, face: &FaceView) -> String {
    let owner = doc
        .bodies()
        .find(|b| b.id == face.owner)
        .map(|b| b.name.to_string())
        .unwrap_or_default();
    let units = doc.internal_units();
    match face.surface {
        Surface::Cylinder(c) => format!(
            "{}: cylinder r={}{} ({:?})",
            owner, c.radius, units, face.side
        ),
        Surface::Other => format!("{}: {} ({:?})", owner, face.surface.type_name(), face.side),
    }
}
