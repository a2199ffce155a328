use serde_json::Value;

use{
    std::{
        fs::File,
        io::{Write, BufWriter}
    },
    super::*
};

pub type CurveWriter = BufWriter<File>;

/// Writes per-day S, E, I and R curves into four files, one line per run.
pub struct SeirWriter
{
    pub writer_s: CurveWriter,
    pub writer_e: CurveWriter,
    pub writer_i: CurveWriter,
    pub writer_r: CurveWriter,
    pub paths: [String; 4]
}

impl SeirWriter
{
    #[inline]
    pub fn writer_iter(&mut self) -> impl Iterator<Item=&mut CurveWriter>
    {
        let slice = [
            &mut self.writer_s,
            &mut self.writer_e,
            &mut self.writer_i,
            &mut self.writer_r
        ];
        slice.into_iter()
    }

    pub fn new(name: &str) -> std::io::Result<Self>
    {
        let paths: [String; 4] = [
            format!("{name}_s.curves"),
            format!("{name}_e.curves"),
            format!("{name}_i.curves"),
            format!("{name}_r.curves")
        ];

        let mut files = Vec::with_capacity(4);
        for path in paths.iter()
        {
            files.push(BufWriter::new(File::create(path)?));
        }
        let mut files = files.into_iter();
        let mut next = || files.next().ok_or_else(|| std::io::Error::other("missing curve file"));

        Ok(
            Self{
                writer_s: next()?,
                writer_e: next()?,
                writer_i: next()?,
                writer_r: next()?,
                paths
            }
        )
    }

    /// label of the line, usually the seed vertex id
    pub fn write_label<L>(&mut self, label: L) -> std::io::Result<()>
    where L: std::fmt::Display
    {
        for w in self.writer_iter()
        {
            write!(w, "{label} ")?;
        }
        Ok(())
    }

    pub fn write_day(&mut self, counts: &DayCounts) -> std::io::Result<()>
    {
        write!(self.writer_s, "{} ", counts.s)?;
        write!(self.writer_e, "{} ", counts.e)?;
        write!(self.writer_i, "{} ", counts.i)?;
        write!(self.writer_r, "{} ", counts.r)
    }

    /// one complete run as one line in each file
    pub fn write_run<L>(&mut self, label: L, data: &[DayCounts]) -> std::io::Result<()>
    where L: std::fmt::Display
    {
        self.write_label(label)?;
        for counts in data
        {
            self.write_day(counts)?;
        }
        self.write_line()
    }

    pub fn write_line(&mut self) -> std::io::Result<()>
    {
        for w in self.writer_iter()
        {
            writeln!(w)?;
        }
        Ok(())
    }

    pub fn write_header(&mut self, jsons: &[Value]) -> std::io::Result<()>
    {
        for w in self.writer_iter()
        {
            write_header(w)?;
            write_jsons(jsons, w)?;
        }

        Ok(())
    }

    pub fn flush(&mut self) -> std::io::Result<()>
    {
        for w in self.writer_iter()
        {
            w.flush()?;
        }
        Ok(())
    }
}

pub fn write_jsons<W: Write>(jsons: &[Value], mut writer: W) -> std::io::Result<()>
{
    for j in jsons{
        write!(writer, "#")?;
        serde_json::to_writer(&mut writer, j)?;
        writeln!(writer)?;
    }
    Ok(())
}

fn write_header(writer: &mut CurveWriter) -> std::io::Result<()>
{
    writeln!(writer, "#Seed Day[0] Day[1] …")?;
    Ok(())
}
