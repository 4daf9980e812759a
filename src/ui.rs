use std::io;
use std::path::Path;
use tokio::fs;

/// Writes any missing shell asset into `root` so a fresh checkout can
/// serve (and precache) the app from a single binary. Existing files are
/// left alone; they are the origin of truth once deployed.
pub async fn seed_assets(root: &Path) -> io::Result<()> {
    fs::create_dir_all(root).await?;
    for (name, content) in [
        ("index.html", SHELL_HTML),
        ("app.js", APP_JS),
        ("manifest.json", MANIFEST_JSON),
    ] {
        let path = root.join(name);
        match fs::metadata(&path).await {
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                fs::write(&path, content).await?;
            }
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

pub const MANIFEST_JSON: &str = r##"{
  "name": "MCAS Tracker",
  "short_name": "MCAS",
  "start_url": "/",
  "display": "standalone",
  "background_color": "#f7f5f0",
  "theme_color": "#4a6b8a",
  "icons": []
}
"##;

pub const SHELL_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <link rel="manifest" href="/manifest.json" />
  <title>MCAS Tracker</title>
  <style>
    :root {
      --bg: #f7f5f0;
      --ink: #2b2a28;
      --accent: #4a6b8a;
      --card: #ffffff;
      --muted: #6b645d;
      --line: rgba(74, 107, 138, 0.18);
    }

    * { box-sizing: border-box; }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", "Segoe UI", sans-serif;
      padding: 24px 16px 48px;
    }

    .app { max-width: 760px; margin: 0 auto; display: grid; gap: 20px; }

    h1 { margin: 0; font-size: 1.8rem; }
    .subtitle { margin: 0; color: var(--muted); font-size: 0.95rem; }

    nav { display: flex; gap: 8px; flex-wrap: wrap; }

    nav button {
      border: 1px solid var(--line);
      background: var(--card);
      color: var(--muted);
      border-radius: 999px;
      padding: 8px 16px;
      font-weight: 600;
      cursor: pointer;
    }

    nav button.active { color: var(--accent); border-color: var(--accent); }

    section.page { display: none; }
    section.page.active { display: grid; gap: 16px; }

    form, .card {
      background: var(--card);
      border: 1px solid var(--line);
      border-radius: 14px;
      padding: 16px;
      display: grid;
      gap: 10px;
    }

    label { display: grid; gap: 4px; font-size: 0.9rem; color: var(--muted); }

    input, select, textarea {
      border: 1px solid var(--line);
      border-radius: 8px;
      padding: 8px;
      font: inherit;
      color: var(--ink);
    }

    .row { display: grid; grid-template-columns: 1fr 1fr; gap: 10px; }

    form button, .export-btn {
      border: none;
      border-radius: 8px;
      padding: 10px 16px;
      background: var(--accent);
      color: white;
      font-weight: 600;
      cursor: pointer;
    }

    .export-btn { background: var(--muted); }

    .entry {
      background: var(--card);
      border: 1px solid var(--line);
      border-radius: 10px;
      padding: 12px;
      margin-bottom: 8px;
    }

    .entry .when { color: var(--muted); font-size: 0.85rem; }
    .entry h4 { margin: 4px 0; }
    .entry p { margin: 2px 0; color: var(--muted); font-size: 0.95rem; }
    .placeholder { color: var(--muted); text-align: center; }

    .status { min-height: 1.2em; color: var(--muted); font-size: 0.95rem; }
    .status[data-type="error"] { color: #c63b2b; }
    .status[data-type="ok"] { color: #2d7a4b; }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>MCAS Tracker</h1>
      <p class="subtitle">Log symptoms, diet, mood, and sleep. Everything stays on this device.</p>
    </header>

    <nav>
      <button id="nav-symptoms" data-section="symptoms" class="active" type="button">Symptoms</button>
      <button id="nav-diet" data-section="diet" type="button">Diet</button>
      <button id="nav-mood" data-section="mood" type="button">Mood</button>
      <button id="nav-sleep" data-section="sleep" type="button">Sleep</button>
    </nav>

    <section id="symptoms-section" class="page active">
      <form id="symptom-form">
        <div class="row">
          <label>When
            <input type="datetime-local" name="timestamp" id="symptom-timestamp" required />
          </label>
          <label>Symptom
            <input type="text" name="symptom_type" placeholder="Flushing, hives..." required />
          </label>
        </div>
        <div class="row">
          <label>Severity: <span id="symptom-severity-label">5</span>/10
            <input type="range" name="severity" id="symptom-severity" min="1" max="10" value="5" />
          </label>
          <label>Duration (minutes, optional)
            <input type="number" name="duration_minutes" min="0" />
          </label>
        </div>
        <label>Triggers (comma-separated)
          <input type="text" name="associated_triggers" placeholder="heat, stress" />
        </label>
        <label>Relief measures
          <input type="text" name="relief_measures" placeholder="antihistamine, rest" />
        </label>
        <button type="submit">Add symptom log</button>
      </form>
      <div id="symptoms-list"></div>
      <button class="export-btn" data-export="symptoms" type="button">Export symptoms CSV</button>
    </section>

    <section id="diet-section" class="page">
      <form id="diet-form">
        <div class="row">
          <label>When
            <input type="datetime-local" name="timestamp" id="diet-timestamp" required />
          </label>
          <label>Meal
            <select name="meal_type">
              <option>Breakfast</option>
              <option>Lunch</option>
              <option>Dinner</option>
              <option>Snack</option>
            </select>
          </label>
        </div>
        <label>Foods (comma-separated)
          <input type="text" name="foods" placeholder="rice, chicken, spinach" />
        </label>
        <label>Perceived histamine level
          <select name="perceived_histamine_level">
            <option>Low</option>
            <option>Medium</option>
            <option>High</option>
            <option>Unknown</option>
          </select>
        </label>
        <label>Notes
          <textarea name="notes" rows="2"></textarea>
        </label>
        <button type="submit">Add diet log</button>
      </form>
      <div id="diet-list"></div>
      <button class="export-btn" data-export="diet" type="button">Export diet CSV</button>
    </section>

    <section id="mood-section" class="page">
      <form id="mood-form">
        <div class="row">
          <label>When
            <input type="datetime-local" name="timestamp" id="mood-timestamp" required />
          </label>
          <label>Emotional state
            <input type="text" name="emotional_state" placeholder="Anxious, calm..." required />
          </label>
        </div>
        <label>Severity: <span id="mood-severity-label">5</span>/10
          <input type="range" name="severity" id="mood-severity" min="1" max="10" value="5" />
        </label>
        <label>Cognitive symptoms (comma-separated)
          <input type="text" name="cognitive_symptoms" placeholder="brain fog, fatigue" />
        </label>
        <label>Stressors (comma-separated)
          <input type="text" name="psychosocial_stressors" placeholder="work, travel" />
        </label>
        <label>Notes
          <textarea name="notes" rows="2"></textarea>
        </label>
        <button type="submit">Add mood entry</button>
      </form>
      <div id="mood-list"></div>
      <button class="export-btn" data-export="mood" type="button">Export mood CSV</button>
    </section>

    <section id="sleep-section" class="page">
      <form id="sleep-form">
        <div class="row">
          <label>Fell asleep
            <input type="datetime-local" name="start_time" id="sleep-start" required />
          </label>
          <label>Woke up
            <input type="datetime-local" name="end_time" id="sleep-end" required />
          </label>
        </div>
        <label>Quality: <span id="sleep-quality-label">3</span>/5
          <input type="range" name="quality" id="sleep-quality" min="1" max="5" value="3" />
        </label>
        <label>Disturbances (comma-separated)
          <input type="text" name="disturbances" placeholder="itching, reflux" />
        </label>
        <label>Notes
          <textarea name="notes" rows="2"></textarea>
        </label>
        <button type="submit">Add sleep record</button>
      </form>
      <div id="sleep-list"></div>
      <button class="export-btn" data-export="sleep" type="button">Export sleep CSV</button>
    </section>

    <button class="export-btn" id="share-report-btn" type="button">Share current log</button>
    <div class="status" id="status"></div>
  </main>
  <script src="/app.js"></script>
</body>
</html>
"#;

pub const APP_JS: &str = r#"// MCAS Tracker shell script. Talks to the local record API; nothing here
// leaves the device.

const statusEl = document.getElementById('status');

const setStatus = (message, type) => {
  statusEl.textContent = message;
  statusEl.dataset.type = type || '';
  if (message) {
    setTimeout(() => { statusEl.textContent = ''; statusEl.dataset.type = ''; }, 2500);
  }
};

const nowLocal = (offsetHours = 0) => {
  const d = new Date(Date.now() + offsetHours * 60 * 60 * 1000);
  const pad = (n) => String(n).padStart(2, '0');
  return `${d.getFullYear()}-${pad(d.getMonth() + 1)}-${pad(d.getDate())}T${pad(d.getHours())}:${pad(d.getMinutes())}`;
};

const resetClocks = () => {
  document.getElementById('symptom-timestamp').value = nowLocal();
  document.getElementById('diet-timestamp').value = nowLocal();
  document.getElementById('mood-timestamp').value = nowLocal();
  document.getElementById('sleep-start').value = nowLocal();
  document.getElementById('sleep-end').value = nowLocal(8);
};

const bindRange = (rangeId, labelId, fallback) => {
  const range = document.getElementById(rangeId);
  const label = document.getElementById(labelId);
  range.addEventListener('input', () => { label.textContent = range.value; });
  return () => { range.value = fallback; label.textContent = fallback; };
};

const resetSymptomSeverity = bindRange('symptom-severity', 'symptom-severity-label', '5');
const resetMoodSeverity = bindRange('mood-severity', 'mood-severity-label', '5');
const resetSleepQuality = bindRange('sleep-quality', 'sleep-quality-label', '3');

const esc = (value) => {
  const div = document.createElement('div');
  div.textContent = value == null ? '' : String(value);
  return div.innerHTML;
};

const entry = (when, title, lines) => {
  const parts = lines.filter(Boolean).map((line) => `<p>${line}</p>`).join('');
  return `<div class="entry"><p class="when">${esc(when)}</p><h4>${title}</h4>${parts}</div>`;
};

const kinds = {
  symptoms: {
    api: '/api/symptoms',
    list: 'symptoms-list',
    empty: 'No symptom logs yet. Add one above!',
    render: (log) => entry(log.timestamp,
      `${esc(log.symptom_type)} (Severity: ${log.severity}/10)`,
      [
        log.duration_minutes ? `Duration: ${log.duration_minutes} mins` : '',
        log.associated_triggers.length ? `Triggers: ${esc(log.associated_triggers.join(', '))}` : '',
        log.relief_measures ? `Relief: ${esc(log.relief_measures)}` : '',
      ]),
  },
  diet: {
    api: '/api/diet',
    list: 'diet-list',
    empty: 'No dietary logs yet. Add one above!',
    render: (log) => entry(`${log.timestamp} - ${log.meal_type}`,
      `Foods: ${esc(log.foods.map((f) => f.name).join(', '))}`,
      [
        `Histamine level: ${esc(log.perceived_histamine_level)}`,
        log.notes ? `Notes: ${esc(log.notes)}` : '',
      ]),
  },
  mood: {
    api: '/api/mood',
    list: 'mood-list',
    empty: 'No mood entries yet. Add one above!',
    render: (log) => entry(log.timestamp,
      `Mood: ${esc(log.emotional_state)} (Severity: ${log.severity}/10)`,
      [
        log.cognitive_symptoms.length ? `Cognitive: ${esc(log.cognitive_symptoms.join(', '))}` : '',
        log.psychosocial_stressors.length ? `Stressors: ${esc(log.psychosocial_stressors.join(', '))}` : '',
        log.notes ? `Notes: ${esc(log.notes)}` : '',
      ]),
  },
  sleep: {
    api: '/api/sleep',
    list: 'sleep-list',
    empty: 'No sleep records yet. Add one above!',
    render: (log) => entry(`From ${log.start_time} to ${log.end_time}`,
      `Sleep quality: ${log.quality}/5`,
      [
        log.duration_hours ? `Duration: ${log.duration_hours.toFixed(1)} hours` : '',
        log.disturbances.length ? `Disturbances: ${esc(log.disturbances.join(', '))}` : '',
        log.notes ? `Notes: ${esc(log.notes)}` : '',
      ]),
  },
};

const refresh = async (kind) => {
  const cfg = kinds[kind];
  const container = document.getElementById(cfg.list);
  try {
    const res = await fetch(cfg.api);
    if (!res.ok) throw new Error(await res.text());
    const records = await res.json();
    container.innerHTML = records.length
      ? records.map(cfg.render).join('')
      : `<p class="placeholder">${cfg.empty}</p>`;
  } catch (err) {
    container.innerHTML = '<p class="placeholder">Could not load entries.</p>';
    setStatus(err.message, 'error');
  }
};

const submitForm = (formId, kind, extraReset) => {
  document.getElementById(formId).addEventListener('submit', async (event) => {
    event.preventDefault();
    const form = event.target;
    const payload = Object.fromEntries(new FormData(form).entries());
    try {
      const res = await fetch(kinds[kind].api, {
        method: 'POST',
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify(payload),
      });
      if (!res.ok) throw new Error(await res.text() || 'Could not save');
      form.reset();
      resetClocks();
      if (extraReset) extraReset();
      setStatus('Saved', 'ok');
      refresh(kind);
    } catch (err) {
      setStatus(err.message, 'error');
    }
  });
};

submitForm('symptom-form', 'symptoms', resetSymptomSeverity);
submitForm('diet-form', 'diet');
submitForm('mood-form', 'mood', resetMoodSeverity);
submitForm('sleep-form', 'sleep', resetSleepQuality);

document.querySelectorAll('.export-btn').forEach((button) => {
  button.addEventListener('click', async () => {
    const kind = button.dataset.export;
    const res = await fetch(`${kinds[kind].api}/export`);
    if (res.status === 404) {
      setStatus(`No ${kind} data to export.`, 'error');
      return;
    }
    if (!res.ok) {
      setStatus('Export failed.', 'error');
      return;
    }
    const disposition = res.headers.get('content-disposition') || '';
    const match = disposition.match(/filename="([^"]+)"/);
    const blob = await res.blob();
    const link = document.createElement('a');
    link.href = URL.createObjectURL(blob);
    link.download = match ? match[1] : `${kind}.csv`;
    link.click();
    URL.revokeObjectURL(link.href);
    setStatus('Export complete.', 'ok');
  });
});

document.getElementById('share-report-btn').addEventListener('click', async () => {
  if (!navigator.share) {
    setStatus('Sharing is not supported on this device.', 'error');
    return;
  }
  const section = document.querySelector('nav button.active').dataset.section;
  try {
    await navigator.share({
      title: 'MCAS Tracker Data',
      text: `MCAS Tracker: My ${section} Log`,
      url: `${window.location.origin}${window.location.pathname}?section=${section}`,
    });
    setStatus('Shared.', 'ok');
  } catch (err) {
    if (err.name !== 'AbortError') setStatus('Could not share.', 'error');
  }
});

document.querySelectorAll('nav button').forEach((button) => {
  button.addEventListener('click', () => {
    document.querySelectorAll('nav button').forEach((b) => b.classList.toggle('active', b === button));
    document.querySelectorAll('section.page').forEach((section) => {
      section.classList.toggle('active', section.id === `${button.dataset.section}-section`);
    });
    refresh(button.dataset.section);
  });
});

resetClocks();
refresh('symptoms');
"#;
