//! The upload form served at `GET /`.
//!
//! Plain HTML with a few lines of inline script; no assets to serve.
//! Field names match the constants in [`crate::options`].

pub const UPLOAD_FORM: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>pandoc gateway</title>
  <style>
    body { margin: 4% 10%; font-family: sans-serif; }
    fieldset { margin-bottom: 1.5em; border: 1px solid #ddd; }
    label { padding-right: 1em; }
    input[type=text] { width: 40em; }
    pre { background: #f5f5f5; padding: .8em; overflow-x: auto; }
  </style>
  <script>
    function setBibliographyEnabled(on) {
      for (const id of ["bib_path", "bib_file", "csl_path"]) {
        document.getElementById(id).disabled = !on;
      }
    }
  </script>
</head>
<body>
  <h1>Markdown conversion</h1>

  <form method="post" action="convert" enctype="multipart/form-data">
    <fieldset>
      <legend>Input <code>in_file</code></legend>
      <input type="file" name="in_file" required>
    </fieldset>

    <fieldset>
      <legend>Output format <code>output</code></legend>
      <label><input type="radio" name="output" value="pdf"> pdf</label>
      <label><input type="radio" name="output" value="tex"> tex</label>
      <label><input type="radio" name="output" value="docx"> docx</label>
      <label><input type="radio" name="output" value="html" checked> html</label>
      <label><input type="radio" name="output" value="rtf"> rtf</label>
    </fieldset>

    <fieldset>
      <legend>Options</legend>
      <label><input type="checkbox" name="standalone" value="on" checked> standalone</label>
      <label><input type="checkbox" name="xelatex" value="on"> xelatex</label>
    </fieldset>

    <fieldset>
      <legend>Citations and filters</legend>
      <label><input type="checkbox" name="crossref" value="on"> crossref</label>
      <label><input type="checkbox" name="citeproc" value="on"
             onchange="setBibliographyEnabled(this.checked)"> citeproc</label>
      <label><input type="checkbox" name="natbib" value="on"> natbib</label>
      <label><input type="checkbox" name="biblatex" value="on"> biblatex</label>
      <p>
        <label for="bib_path"><code>bib_path</code></label>
        <input type="text" id="bib_path" name="bib_path" disabled
               placeholder="https://example.org/library.bib or /srv/bib/library.bib">
        or upload
        <input type="file" id="bib_file" name="bib_file" disabled>
      </p>
      <p>
        <label for="csl_path"><code>csl_path</code></label>
        <input type="text" id="csl_path" name="csl_path" disabled
               placeholder="https://example.org/style.csl">
      </p>
    </fieldset>

    <button type="submit">Convert</button>
  </form>

  <h2>From the command line</h2>
  <pre>curl -F in_file=@paper.md -F output=pdf -F standalone=on \
     -F citeproc=on -F bib_path=https://example.org/library.bib \
     http://localhost:8080/convert -o paper.pdf</pre>
  <p>
    Leave out options you do not want. Any value, even <code>False</code>,
    turns a flag on. An uploaded <code>bib_file</code> wins over
    <code>bib_path</code>, and both are ignored unless <code>citeproc</code>
    is set.
  </p>
</body>
</html>
"#;
