//! Static page shells. The interesting behavior lives in the route gate and
//! the task handlers; these exist so the redirect targets are real pages.

use actix_web::{HttpResponse, Responder};

pub async fn login_page() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(LOGIN_PAGE)
}

pub async fn signup_page() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(SIGNUP_PAGE)
}

pub async fn dashboard_page() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(DASHBOARD_PAGE)
}

const LOGIN_PAGE: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>Sign in - Task Tracker</title></head>
<body>
<h1>Sign in</h1>
<form id="login-form">
  <input type="email" id="email" placeholder="Email" required>
  <input type="password" id="password" placeholder="Password" required>
  <button type="submit">Sign in</button>
</form>
<p id="error"></p>
<p><a href="/signup">Need an account? Sign up</a></p>
<script>
document.getElementById("login-form").addEventListener("submit", async (e) => {
  e.preventDefault();
  const res = await fetch("/login", {
    method: "POST",
    headers: { "Content-Type": "application/json" },
    body: JSON.stringify({
      email: document.getElementById("email").value,
      password: document.getElementById("password").value,
    }),
  });
  const body = await res.json();
  if (body.error) {
    document.getElementById("error").textContent = body.error;
  } else {
    window.location.assign("/dashboard");
  }
});
</script>
</body>
</html>
"#;

const SIGNUP_PAGE: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>Sign up - Task Tracker</title></head>
<body>
<h1>Create your account</h1>
<form id="signup-form">
  <input type="email" id="email" placeholder="Email" required>
  <input type="password" id="password" placeholder="Password" required>
  <button type="submit">Sign up</button>
</form>
<p id="error"></p>
<p><a href="/login">Already have an account? Sign in</a></p>
<script>
document.getElementById("signup-form").addEventListener("submit", async (e) => {
  e.preventDefault();
  const res = await fetch("/signup", {
    method: "POST",
    headers: { "Content-Type": "application/json" },
    body: JSON.stringify({
      email: document.getElementById("email").value,
      password: document.getElementById("password").value,
    }),
  });
  const body = await res.json();
  if (body.error) {
    document.getElementById("error").textContent = body.error;
  } else {
    window.location.assign("/dashboard");
  }
});
</script>
</body>
</html>
"#;

const DASHBOARD_PAGE: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>Task Tracker</title></head>
<body>
<header>
  <h1>Task Tracker</h1>
  <button id="logout">Logout</button>
</header>
<main>
  <p id="stats"></p>
  <ul id="tasks"></ul>
  <p id="error"></p>
</main>
<script>
const params = new URLSearchParams(window.location.search);
const query = new URLSearchParams();
if (params.get("filter")) query.set("filter", params.get("filter"));
if (params.get("sort")) query.set("sort", params.get("sort"));

async function loadTasks() {
  const res = await fetch("/dashboard/tasks?" + query.toString());
  const body = await res.json();
  if (body.error) {
    document.getElementById("error").textContent = body.error;
    return;
  }
  const counts = { todo: 0, in_progress: 0, done: 0 };
  const list = document.getElementById("tasks");
  list.innerHTML = "";
  for (const task of body.tasks) {
    counts[task.status] += 1;
    const item = document.createElement("li");
    item.textContent =
      task.title + " [" + task.status + "] due " + task.due_date;
    list.appendChild(item);
  }
  document.getElementById("stats").textContent =
    body.tasks.length + " tasks: " + counts.todo + " todo, " +
    counts.in_progress + " in progress, " + counts.done + " done";
}

document.getElementById("logout").addEventListener("click", async () => {
  await fetch("/logout", { method: "POST" });
  window.location.assign("/login");
});

loadTasks();
</script>
</body>
</html>
"#;
